//! Wall-clock time arithmetic for ride sessions.
//!
//! Sessions live inside a single calendar day, so times are kept as whole
//! minutes since midnight. Arithmetic never rolls over into the next day: a
//! start of `23:30` plus 90 minutes yields `25:00`. Callers decide what to do
//! with times past midnight (the welfare validator rejects them).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minutes in one calendar day; also the value of `24:00`.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Error returned when a `HH:MM` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseError {
    #[error("time '{0}' is not in HH:MM format")]
    Format(String),
    #[error("hour {0} is out of range 00-23")]
    HourOutOfRange(u32),
    #[error("minute {0} is out of range 00-59")]
    MinuteOutOfRange(u32),
}

/// A time of day with minute granularity.
///
/// Ordering follows chronological order, which matches ordering of the
/// zero-padded `HH:MM` text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u32);

impl ClockTime {
    /// `00:00`.
    pub const MIDNIGHT: ClockTime = ClockTime(0);
    /// `24:00`, the latest instant a session may end.
    pub const END_OF_DAY: ClockTime = ClockTime(MINUTES_PER_DAY);

    /// Build a time of day, rejecting anything outside `00:00..=23:59`.
    pub fn new(hour: u32, minute: u32) -> Result<Self, TimeParseError> {
        if hour > 23 {
            return Err(TimeParseError::HourOutOfRange(hour));
        }
        if minute > 59 {
            return Err(TimeParseError::MinuteOutOfRange(minute));
        }
        Ok(Self(hour * 60 + minute))
    }

    /// Build from a raw minute count. Values past a day are kept as-is.
    pub fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.0
    }

    pub fn hour(&self) -> u32 {
        self.0 / 60
    }

    pub fn minute(&self) -> u32 {
        self.0 % 60
    }

    /// True when the time is not later than `24:00`.
    pub fn is_within_day(&self) -> bool {
        self.0 <= MINUTES_PER_DAY
    }
}

/// Add `minutes` to `time` without wrapping at midnight. Saturates at the
/// largest representable minute count.
pub fn add_minutes(time: ClockTime, minutes: u32) -> ClockTime {
    ClockTime(time.0.saturating_add(minutes))
}

/// Signed number of minutes from `from` to `to`; negative when `to` is earlier.
pub fn minutes_between(from: ClockTime, to: ClockTime) -> i64 {
    i64::from(to.0) - i64::from(from.0)
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = TimeParseError;

    /// Parses `H:MM` or `HH:MM`. `24:00` is accepted as the end of the day.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_err = || TimeParseError::Format(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(format_err)?;

        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(h) || h.len() > 2 || !all_digits(m) || m.len() != 2 {
            return Err(format_err());
        }

        let hour: u32 = h.parse().map_err(|_| format_err())?;
        let minute: u32 = m.parse().map_err(|_| format_err())?;

        if hour == 24 && minute == 0 {
            return Ok(Self::END_OF_DAY);
        }
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = TimeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

/// Half-open interval `[start, end)` within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeRange {
    /// Range starting at `start` and lasting `duration_minutes`.
    pub fn starting_at(start: ClockTime, duration_minutes: u32) -> Self {
        Self {
            start,
            end: add_minutes(start, duration_minutes),
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        minutes_between(self.start, self.end)
    }

    /// Two ranges overlap iff `s1 < e2 && s2 < e1`; touching ends do not count.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display_zero_padded() {
        assert_eq!(t("9:05").to_string(), "09:05");
        assert_eq!(t("00:00"), ClockTime::MIDNIGHT);
        assert_eq!(t("23:59").minutes_since_midnight(), 1439);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!("".parse::<ClockTime>(), Err(TimeParseError::Format(_))));
        assert!(matches!("0930".parse::<ClockTime>(), Err(TimeParseError::Format(_))));
        assert!(matches!("09:5".parse::<ClockTime>(), Err(TimeParseError::Format(_))));
        assert!(matches!("-1:00".parse::<ClockTime>(), Err(TimeParseError::Format(_))));
        assert_eq!(
            "25:00".parse::<ClockTime>(),
            Err(TimeParseError::HourOutOfRange(25))
        );
        assert_eq!(
            "10:60".parse::<ClockTime>(),
            Err(TimeParseError::MinuteOutOfRange(60))
        );
    }

    #[test]
    fn test_parse_end_of_day() {
        assert_eq!(t("24:00"), ClockTime::END_OF_DAY);
        assert!("24:01".parse::<ClockTime>().is_err());
    }

    #[test]
    fn test_add_minutes_carries_hours() {
        assert_eq!(add_minutes(t("09:00"), 90).to_string(), "10:30");
        assert_eq!(add_minutes(t("09:45"), 15).to_string(), "10:00");
        assert_eq!(add_minutes(t("09:45"), 0), t("09:45"));
    }

    #[test]
    fn test_add_minutes_does_not_roll_over_midnight() {
        let end = add_minutes(t("23:30"), 90);
        assert_eq!(end.to_string(), "25:00");
        assert!(!end.is_within_day());
        assert!(add_minutes(t("23:00"), 60).is_within_day());
    }

    #[test]
    fn test_add_minutes_saturates() {
        let end = add_minutes(t("09:00"), u32::MAX - 30);
        assert_eq!(end.minutes_since_midnight(), u32::MAX);
        assert!(end > t("09:00"));
        assert!(!end.is_within_day());
    }

    #[test]
    fn test_minutes_between_signed() {
        assert_eq!(minutes_between(t("10:30"), t("11:00")), 30);
        assert_eq!(minutes_between(t("11:00"), t("10:30")), -30);
        assert_eq!(minutes_between(t("10:00"), t("10:00")), 0);
    }

    #[test]
    fn test_ordering_matches_text_ordering() {
        let mut times = vec![t("13:00"), t("09:30"), t("9:00"), t("10:15")];
        times.sort();
        let text: Vec<String> = times.iter().map(ToString::to_string).collect();
        let mut sorted_text = text.clone();
        sorted_text.sort();
        assert_eq!(text, sorted_text);
    }

    #[test]
    fn test_ranges_half_open() {
        let a = TimeRange::starting_at(t("09:00"), 60);
        let b = TimeRange::starting_at(t("10:00"), 30);
        let c = TimeRange::starting_at(t("09:30"), 60);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
        assert_eq!(a.to_string(), "09:00-10:00");
        assert_eq!(c.duration_minutes(), 60);
    }

    #[test]
    fn test_serde_uses_text_form() {
        let json = serde_json::to_string(&t("08:05")).unwrap();
        assert_eq!(json, "\"08:05\"");
        let back: ClockTime = serde_json::from_str("\"17:45\"").unwrap();
        assert_eq!(back, t("17:45"));
        assert!(serde_json::from_str::<ClockTime>("\"7pm\"").is_err());
    }
}
