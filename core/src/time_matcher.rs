//! Time matchers.
//!
//! Time literals end in a military time-zone letter: `Z` is UTC, `A`..`M`
//! (skipping `J`) are UTC+1..UTC+12, `N`..`Y` are UTC-1..UTC-12.
//!
//! - absolute: `yyyyMMddhhmmssZ`, e.g. `20240101080000H` (08:00 at UTC+8)
//! - time of day: `hhmmssZ`, e.g. `093000Z`

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, TimeZone, Timelike};

use crate::{Value, ValueError, ValueMatcher};

const SECONDS_PER_DAY: i64 = 86_400;

/// UTC offset for a military zone letter.
#[must_use]
pub fn zone_offset(letter: char) -> Option<FixedOffset> {
    let hours: i32 = match letter {
        'Z' => 0,
        'A'..='I' => letter as i32 - 'A' as i32 + 1,
        'K'..='M' => letter as i32 - 'K' as i32 + 10,
        'N'..='Y' => -(letter as i32 - 'N' as i32 + 1),
        _ => return None,
    };
    FixedOffset::east_opt(hours * 3600)
}

fn split_zone(s: &str, digits: usize) -> Result<(&str, FixedOffset), ValueError> {
    let bad = || ValueError::Time(s.to_string());
    if s.len() != digits + 1 || !s.is_char_boundary(digits) {
        return Err(bad());
    }
    let (body, zone) = s.split_at(digits);
    if !body.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let offset = zone.chars().next().and_then(zone_offset).ok_or_else(bad)?;
    Ok((body, offset))
}

/// Parse an absolute `yyyyMMddhhmmssZ` literal.
///
/// # Errors
///
/// Returns [`ValueError::Time`] if the literal is malformed.
pub fn parse_time(s: &str) -> Result<DateTime<FixedOffset>, ValueError> {
    let (body, offset) = split_zone(s, 14)?;
    let naive = NaiveDateTime::parse_from_str(body, "%Y%m%d%H%M%S")
        .map_err(|_| ValueError::Time(s.to_string()))?;
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| ValueError::Time(s.to_string()))
}

/// Parse an `hhmmssZ` literal into seconds since UTC midnight.
///
/// # Errors
///
/// Returns [`ValueError::Time`] if the literal is malformed.
pub fn parse_time_of_day(s: &str) -> Result<u32, ValueError> {
    let (body, offset) = split_zone(s, 6)?;
    let time =
        NaiveTime::parse_from_str(body, "%H%M%S").map_err(|_| ValueError::Time(s.to_string()))?;
    let local = i64::from(time.num_seconds_from_midnight());
    let utc = (local - i64::from(offset.local_minus_utc())).rem_euclid(SECONDS_PER_DAY);
    u32::try_from(utc).map_err(|_| ValueError::Time(s.to_string()))
}

/// Inclusive absolute time range.
#[derive(Debug, Clone)]
pub struct TimeMatcher {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

impl TimeMatcher {
    /// # Errors
    ///
    /// [`ValueError::Time`] for a malformed bound, or
    /// [`ValueError::TimeRangeInverted`] if `start` is after `end`.
    pub fn new(start: &str, end: &str) -> Result<Self, ValueError> {
        let start_t = parse_time(start)?;
        let end_t = parse_time(end)?;
        if start_t > end_t {
            return Err(ValueError::TimeRangeInverted {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self {
            start: start_t,
            end: end_t,
        })
    }
}

impl ValueMatcher for TimeMatcher {
    fn matches(&self, value: &Value) -> bool {
        value
            .as_time()
            .is_some_and(|t| self.start <= *t && *t <= self.end)
    }
}

/// Daily time-of-day window. A window whose start is later than its end
/// wraps past midnight.
///
/// ```
/// use gatecond::{PeriodicTimeMatcher, Value, ValueMatcher};
/// use chrono::DateTime;
///
/// let night = PeriodicTimeMatcher::new("220000Z", "060000Z", "").unwrap();
/// let t = DateTime::parse_from_rfc3339("2024-05-01T23:30:00Z").unwrap();
/// assert!(night.matches(&Value::Time(t)));
/// ```
#[derive(Debug, Clone)]
pub struct PeriodicTimeMatcher {
    start: u32,
    end: u32,
}

impl PeriodicTimeMatcher {
    /// # Errors
    ///
    /// [`ValueError::Time`] for a malformed bound, or [`ValueError::Period`]
    /// for any period other than `""` (daily).
    pub fn new(start: &str, end: &str, period: &str) -> Result<Self, ValueError> {
        if !period.is_empty() {
            return Err(ValueError::Period(period.to_string()));
        }
        Ok(Self {
            start: parse_time_of_day(start)?,
            end: parse_time_of_day(end)?,
        })
    }
}

impl ValueMatcher for PeriodicTimeMatcher {
    fn matches(&self, value: &Value) -> bool {
        let Some(t) = value.as_time() else {
            return false;
        };
        let secs = t.naive_utc().time().num_seconds_from_midnight();
        if self.start <= self.end {
            self.start <= secs && secs <= self.end
        } else {
            secs >= self.start || secs <= self.end
        }
    }
}
