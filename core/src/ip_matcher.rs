//! IP address matchers.
//!
//! Addresses are compared in their 16-byte form (IPv4 as IPv4-mapped IPv6), so
//! `2001:DB8:2de::e13` and `2001:0db8:02de:0::e13` are the same address.

use std::net::IpAddr;

use crate::{Value, ValueError, ValueMatcher};

/// 16-byte form of an address.
#[must_use]
pub fn ip_bytes(ip: IpAddr) -> [u8; 16] {
    match ip {
        IpAddr::V4(v4) => v4.to_ipv6_mapped().octets(),
        IpAddr::V6(v6) => v6.octets(),
    }
}

/// Parse one address, ignoring surrounding whitespace.
///
/// # Errors
///
/// Returns [`ValueError::Ip`] if `s` is not an IPv4 or IPv6 literal.
pub fn parse_ip(s: &str) -> Result<IpAddr, ValueError> {
    s.trim()
        .parse()
        .map_err(|_| ValueError::Ip(s.to_string()))
}

/// Exact membership in a `|`-delimited address set.
///
/// ```
/// use gatecond::{IpInMatcher, Value, ValueMatcher};
///
/// let m = IpInMatcher::new("1.1.1.1|2001:DB8:2de::e13").unwrap();
/// assert!(m.matches(&Value::Ip("2001:0db8:02de:0::e13".parse().unwrap())));
/// assert!(!m.matches(&Value::Ip("2002:0db8:02de:0::e13".parse().unwrap())));
/// ```
#[derive(Debug, Clone)]
pub struct IpInMatcher {
    addrs: Vec<[u8; 16]>,
}

impl IpInMatcher {
    /// # Errors
    ///
    /// Returns [`ValueError::Ip`] for the first element that does not parse.
    pub fn new(patterns: &str) -> Result<Self, ValueError> {
        let mut addrs = patterns
            .split('|')
            .map(|p| parse_ip(p).map(ip_bytes))
            .collect::<Result<Vec<_>, _>>()?;
        addrs.sort_unstable();
        addrs.dedup();
        Ok(Self { addrs })
    }
}

impl ValueMatcher for IpInMatcher {
    fn matches(&self, value: &Value) -> bool {
        value
            .as_ip()
            .is_some_and(|ip| self.addrs.binary_search(&ip_bytes(ip)).is_ok())
    }
}

/// Inclusive address range `[start, end]`.
#[derive(Debug, Clone)]
pub struct IpRangeMatcher {
    start: [u8; 16],
    end: [u8; 16],
}

impl IpRangeMatcher {
    /// # Errors
    ///
    /// - [`ValueError::Ip`] if either bound does not parse
    /// - [`ValueError::IpFamilyMismatch`] if one bound is IPv4 and the other IPv6
    /// - [`ValueError::IpRangeInverted`] if `start > end`
    pub fn new(start: &str, end: &str) -> Result<Self, ValueError> {
        let start_ip = parse_ip(start)?;
        let end_ip = parse_ip(end)?;

        if start_ip.is_ipv4() != end_ip.is_ipv4() {
            return Err(ValueError::IpFamilyMismatch {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let (start_bytes, end_bytes) = (ip_bytes(start_ip), ip_bytes(end_ip));
        if start_bytes > end_bytes {
            return Err(ValueError::IpRangeInverted {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        Ok(Self {
            start: start_bytes,
            end: end_bytes,
        })
    }
}

impl ValueMatcher for IpRangeMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.as_ip().is_some_and(|ip| {
            let b = ip_bytes(ip);
            self.start <= b && b <= self.end
        })
    }
}
