//! `ValueMatcher`: domain-agnostic tests over fetched [`Value`]s.
//!
//! Each matcher does its expensive work (splitting, folding, sorting, regex
//! compilation) once in its constructor. `matches` is a read-only lookup.
//!
//! String matchers accept [`Value::Str`] and [`Value::StrList`]; a list
//! matches if any of its elements does. Any other kind is a non-match.
//!
//! # Available Matchers
//!
//! - [`BoolMatcher`]: flag equality
//! - [`ExactMatcher`]: one string, optional case folding
//! - [`InMatcher`]: set membership by binary search
//! - [`PrefixInMatcher`] / [`SuffixInMatcher`] / [`ContainMatcher`]: linear scans
//! - [`PathElementPrefixMatcher`]: prefix on whole path elements
//! - [`RegMatcher`]: one compiled regex
//!
//! IP, hash-bucket and time matchers live in their own modules.

use std::fmt::Debug;

use regex::Regex;

use crate::{Value, ValueError};

/// Tests a fetched [`Value`].
///
/// # Example
///
/// ```
/// use gatecond::{InMatcher, Value, ValueMatcher};
///
/// let m = InMatcher::new("GET|HEAD", false);
/// assert!(m.matches(&Value::from("HEAD")));
/// assert!(!m.matches(&Value::from("POST")));
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `ValueMatcher`",
    label = "this type cannot match a fetched Value",
    note = "implement `matches(&self, &Value) -> bool`"
)]
pub trait ValueMatcher: Send + Sync + Debug {
    /// Returns `true` if `value` matches. A value of a kind this matcher does
    /// not understand never matches.
    fn matches(&self, value: &Value) -> bool;
}

#[diagnostic::do_not_recommend]
impl ValueMatcher for Box<dyn ValueMatcher> {
    fn matches(&self, value: &Value) -> bool {
        (**self).matches(value)
    }
}

/// Split a `|`-delimited pattern list. Empty elements are kept.
#[must_use]
pub fn split_patterns(patterns: &str) -> Vec<String> {
    patterns.split('|').map(str::to_string).collect()
}

fn fold(s: &str, fold_case: bool) -> String {
    if fold_case {
        s.to_uppercase()
    } else {
        s.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Bool
// ═══════════════════════════════════════════════════════════════════════════════

/// Matches a [`Value::Bool`] equal to the expected flag.
#[derive(Debug, Clone, Copy)]
pub struct BoolMatcher {
    expected: bool,
}

impl BoolMatcher {
    #[must_use]
    pub const fn new(expected: bool) -> Self {
        Self { expected }
    }
}

impl ValueMatcher for BoolMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.as_bool() == Some(self.expected)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// String Matchers
// ═══════════════════════════════════════════════════════════════════════════════

/// Exact string equality.
///
/// ```
/// use gatecond::{ExactMatcher, Value, ValueMatcher};
///
/// let m = ExactMatcher::new("HTTP/1.1", true);
/// assert!(m.matches(&Value::from("http/1.1")));
/// ```
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    expected: String,
    fold_case: bool,
}

impl ExactMatcher {
    /// With `fold_case`, both sides are upper-cased before comparing.
    #[must_use]
    pub fn new(expected: &str, fold_case: bool) -> Self {
        Self {
            expected: fold(expected, fold_case),
            fold_case,
        }
    }
}

impl ValueMatcher for ExactMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.any_str(|s| {
            if self.fold_case {
                s.to_uppercase() == self.expected
            } else {
                s == self.expected
            }
        })
    }
}

/// Membership in a `|`-delimited set.
///
/// Patterns are sorted at construction; lookups are a binary search.
#[derive(Debug, Clone)]
pub struct InMatcher {
    patterns: Vec<String>,
    fold_case: bool,
}

impl InMatcher {
    #[must_use]
    pub fn new(patterns: &str, fold_case: bool) -> Self {
        Self::from_list(split_patterns(patterns), fold_case)
    }

    /// Build from already split patterns.
    #[must_use]
    pub fn from_list(patterns: Vec<String>, fold_case: bool) -> Self {
        let mut patterns: Vec<String> = patterns.iter().map(|p| fold(p, fold_case)).collect();
        patterns.sort_unstable();
        patterns.dedup();
        Self {
            patterns,
            fold_case,
        }
    }

    /// The sorted (and folded) pattern set.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    fn contains(&self, s: &str) -> bool {
        if self.fold_case {
            self.patterns.binary_search(&s.to_uppercase()).is_ok()
        } else {
            self.patterns
                .binary_search_by(|p| p.as_str().cmp(s))
                .is_ok()
        }
    }
}

impl ValueMatcher for InMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.any_str(|s| self.contains(s))
    }
}

/// Value starts with any of the patterns.
#[derive(Debug, Clone)]
pub struct PrefixInMatcher {
    patterns: Vec<String>,
    fold_case: bool,
}

impl PrefixInMatcher {
    #[must_use]
    pub fn new(patterns: &str, fold_case: bool) -> Self {
        Self {
            patterns: split_patterns(patterns)
                .iter()
                .map(|p| fold(p, fold_case))
                .collect(),
            fold_case,
        }
    }
}

impl ValueMatcher for PrefixInMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.any_str(|s| {
            let s = fold(s, self.fold_case);
            self.patterns.iter().any(|p| s.starts_with(p.as_str()))
        })
    }
}

/// Value ends with any of the patterns.
#[derive(Debug, Clone)]
pub struct SuffixInMatcher {
    patterns: Vec<String>,
    fold_case: bool,
}

impl SuffixInMatcher {
    #[must_use]
    pub fn new(patterns: &str, fold_case: bool) -> Self {
        Self {
            patterns: split_patterns(patterns)
                .iter()
                .map(|p| fold(p, fold_case))
                .collect(),
            fold_case,
        }
    }
}

impl ValueMatcher for SuffixInMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.any_str(|s| {
            let s = fold(s, self.fold_case);
            self.patterns.iter().any(|p| s.ends_with(p.as_str()))
        })
    }
}

/// Value contains any of the patterns as a substring.
#[derive(Debug, Clone)]
pub struct ContainMatcher {
    patterns: Vec<String>,
    fold_case: bool,
}

impl ContainMatcher {
    #[must_use]
    pub fn new(patterns: &str, fold_case: bool) -> Self {
        Self {
            patterns: split_patterns(patterns)
                .iter()
                .map(|p| fold(p, fold_case))
                .collect(),
            fold_case,
        }
    }
}

impl ValueMatcher for ContainMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.any_str(|s| {
            let s = fold(s, self.fold_case);
            self.patterns.iter().any(|p| s.contains(p.as_str()))
        })
    }
}

/// Prefix match on whole path elements.
///
/// Both patterns and values are given a trailing `/` before comparing, so
/// `/path` matches `/path` and `/path/a` but not `/pathological`.
///
/// ```
/// use gatecond::{PathElementPrefixMatcher, Value, ValueMatcher};
///
/// let m = PathElementPrefixMatcher::new("/path", false);
/// assert!(m.matches(&Value::from("/path/a/c")));
/// assert!(m.matches(&Value::from("/path")));
/// assert!(!m.matches(&Value::from("/pathabc")));
/// ```
#[derive(Debug, Clone)]
pub struct PathElementPrefixMatcher {
    patterns: Vec<String>,
    fold_case: bool,
}

impl PathElementPrefixMatcher {
    #[must_use]
    pub fn new(patterns: &str, fold_case: bool) -> Self {
        Self {
            patterns: split_patterns(patterns)
                .iter()
                .map(|p| with_trailing_slash(fold(p, fold_case)))
                .collect(),
            fold_case,
        }
    }
}

fn with_trailing_slash(mut s: String) -> String {
    if !s.ends_with('/') {
        s.push('/');
    }
    s
}

impl ValueMatcher for PathElementPrefixMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.any_str(|s| {
            let s = with_trailing_slash(fold(s, self.fold_case));
            self.patterns.iter().any(|p| s.starts_with(p.as_str()))
        })
    }
}

/// One compiled regular expression, unanchored unless the pattern anchors
/// itself.
#[derive(Debug, Clone)]
pub struct RegMatcher {
    regex: Regex,
}

impl RegMatcher {
    /// # Errors
    ///
    /// Returns [`ValueError::Regex`] if the pattern does not compile,
    /// including when the compiled program would exceed the `regex` crate's
    /// size limit.
    pub fn new(pattern: &str) -> Result<Self, ValueError> {
        let regex = Regex::new(pattern).map_err(|e| ValueError::Regex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { regex })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl ValueMatcher for RegMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.any_str(|s| self.regex.is_match(s))
    }
}
