//! Hash-bucket matcher for percentage-style rollout rules.
//!
//! A value is hashed with MurmurHash3 (x64, 128-bit, seed 0), the first 64-bit
//! half is reduced modulo [`HASH_BUCKETS`], and the bucket is looked up in a
//! table built from `N` / `N-M` sections.

use std::net::IpAddr;

use crate::ip_matcher::ip_bytes;
use crate::{Value, ValueError, ValueMatcher};

/// Size of the bucket space.
pub const HASH_BUCKETS: u64 = 10_000;

// ═══════════════════════════════════════════════════════════════════════════════
// MurmurHash3 x64_128
// ═══════════════════════════════════════════════════════════════════════════════

const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;

#[inline]
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}

#[inline]
fn mix_k1(k1: u64) -> u64 {
    k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2)
}

#[inline]
fn mix_k2(k2: u64) -> u64 {
    k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1)
}

fn read_u64_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// MurmurHash3 x64_128 of `data` with `seed`, as `(h1, h2)`.
#[must_use]
pub fn murmur3_x64_128(data: &[u8], seed: u64) -> (u64, u64) {
    let mut h1 = seed;
    let mut h2 = seed;

    let mut blocks = data.chunks_exact(16);
    for block in &mut blocks {
        let k1 = read_u64_le(&block[..8]);
        let k2 = read_u64_le(&block[8..]);

        h1 ^= mix_k1(k1);
        h1 = h1
            .rotate_left(27)
            .wrapping_add(h2)
            .wrapping_mul(5)
            .wrapping_add(0x52dc_e729);

        h2 ^= mix_k2(k2);
        h2 = h2
            .rotate_left(31)
            .wrapping_add(h1)
            .wrapping_mul(5)
            .wrapping_add(0x3849_5ab5);
    }

    let tail = blocks.remainder();
    if tail.len() > 8 {
        h2 ^= mix_k2(read_u64_le(&tail[8..]));
    }
    if !tail.is_empty() {
        h1 ^= mix_k1(read_u64_le(&tail[..tail.len().min(8)]));
    }

    let len = data.len() as u64;
    h1 ^= len;
    h2 ^= len;
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    h1 = fmix64(h1);
    h2 = fmix64(h2);
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    (h1, h2)
}

/// Bucket of `data` in `0..HASH_BUCKETS`.
#[must_use]
pub fn bucket(data: &[u8]) -> u64 {
    murmur3_x64_128(data, 0).0 % HASH_BUCKETS
}

// ═══════════════════════════════════════════════════════════════════════════════
// Matcher
// ═══════════════════════════════════════════════════════════════════════════════

/// Matches values whose hash bucket is in a configured set.
///
/// Sections are `|`-delimited, each a single bucket `N` or an inclusive range
/// `N-M`, with `0 <= N <= M < 10000`.
///
/// ```
/// use gatecond::{HashValueMatcher, Value, ValueMatcher};
///
/// let m = HashValueMatcher::new("4073|5000-9999", true).unwrap();
/// assert!(m.matches(&Value::from("test-uid-0002")));
/// assert!(!m.matches(&Value::from("test-uid-0003")));
/// ```
#[derive(Clone)]
pub struct HashValueMatcher {
    buckets: Box<[bool]>,
    lower_case: bool,
}

impl std::fmt::Debug for HashValueMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashValueMatcher")
            .field("selected", &self.buckets.iter().filter(|b| **b).count())
            .field("lower_case", &self.lower_case)
            .finish()
    }
}

impl HashValueMatcher {
    /// # Errors
    ///
    /// - [`ValueError::HashSection`] for a non-numeric section
    /// - [`ValueError::HashOutOfRange`] for a bound of 10000 or more
    /// - [`ValueError::HashRangeInverted`] for `N-M` with `N > M`
    pub fn new(sections: &str, lower_case: bool) -> Result<Self, ValueError> {
        let mut buckets = vec![false; HASH_BUCKETS as usize].into_boxed_slice();

        for section in sections.split('|') {
            let (start, end) = parse_section(section)?;
            for slot in &mut buckets[start as usize..=end as usize] {
                *slot = true;
            }
        }

        Ok(Self {
            buckets,
            lower_case,
        })
    }

    /// Returns `true` if bucket `n` is selected.
    #[must_use]
    pub fn contains_bucket(&self, n: u64) -> bool {
        usize::try_from(n)
            .ok()
            .and_then(|i| self.buckets.get(i))
            .copied()
            .unwrap_or(false)
    }

    fn matches_str(&self, s: &str) -> bool {
        let n = if self.lower_case {
            bucket(s.to_lowercase().as_bytes())
        } else {
            bucket(s.as_bytes())
        };
        self.contains_bucket(n)
    }

    fn matches_ip(&self, ip: IpAddr) -> bool {
        self.contains_bucket(bucket(&ip_bytes(ip)))
    }
}

fn parse_bound(s: &str, section: &str) -> Result<u64, ValueError> {
    let n: u64 = s
        .trim()
        .parse()
        .map_err(|_| ValueError::HashSection(section.to_string()))?;
    if n >= HASH_BUCKETS {
        return Err(ValueError::HashOutOfRange {
            value: n,
            max: HASH_BUCKETS,
        });
    }
    Ok(n)
}

fn parse_section(section: &str) -> Result<(u64, u64), ValueError> {
    match section.split_once('-') {
        None => {
            let n = parse_bound(section, section)?;
            Ok((n, n))
        }
        Some((start, end)) => {
            let start = parse_bound(start, section)?;
            let end = parse_bound(end, section)?;
            if start > end {
                return Err(ValueError::HashRangeInverted { start, end });
            }
            Ok((start, end))
        }
    }
}

impl ValueMatcher for HashValueMatcher {
    fn matches(&self, value: &Value) -> bool {
        match value {
            Value::Ip(ip) => self.matches_ip(*ip),
            other => other.any_str(|s| self.matches_str(s)),
        }
    }
}
