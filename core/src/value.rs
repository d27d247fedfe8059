//! `Value`: the typed data that flows from a [`Fetcher`](crate::Fetcher) to a
//! [`ValueMatcher`](crate::ValueMatcher).
//!
//! The set of kinds is closed. Every matcher decides explicitly what each kind
//! means to it, and a kind a matcher does not understand is a non-match.

use std::net::IpAddr;

use chrono::{DateTime, FixedOffset};

/// A fetched value.
///
/// # Example
///
/// ```
/// use gatecond::Value;
///
/// let v = Value::from("example.org");
/// assert_eq!(v.as_str(), Some("example.org"));
/// assert_eq!(v.kind(), "string");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A single string: path, host, header value, ...
    Str(String),
    /// Several strings: query keys, header names, tag values, ...
    StrList(Vec<String>),
    /// An IPv4 or IPv6 address.
    Ip(IpAddr),
    /// A flag.
    Bool(bool),
    /// A point in time with its UTC offset.
    Time(DateTime<FixedOffset>),
}

impl Value {
    /// Kind name, used in traces and error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::StrList(_) => "string_list",
            Self::Ip(_) => "ip",
            Self::Bool(_) => "bool",
            Self::Time(_) => "time",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_ip(&self) -> Option<IpAddr> {
        match self {
            Self::Ip(ip) => Some(*ip),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_time(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Self::Time(t) => Some(t),
            _ => None,
        }
    }

    /// Returns `true` if `pred` holds for this string, or for any element of
    /// this string list. Other kinds never satisfy it.
    pub fn any_str(&self, mut pred: impl FnMut(&str) -> bool) -> bool {
        match self {
            Self::Str(s) => pred(s),
            Self::StrList(list) => list.iter().any(|s| pred(s)),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(list: Vec<String>) -> Self {
        Self::StrList(list)
    }
}

impl From<IpAddr> for Value {
    fn from(ip: IpAddr) -> Self {
        Self::Ip(ip)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(t: DateTime<FixedOffset>) -> Self {
        Self::Time(t)
    }
}
