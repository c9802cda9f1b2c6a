//! Timetable time handling.
//!
//! Timetables give times relative to the start of the service day as
//! "HH:MM" strings. A trip that runs past midnight keeps counting, so
//! "24:35" is twenty-five minutes to one the following morning.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Latest representable time: 47:59 on the service day.
const MAX_MINUTES: u16 = 2 * MINUTES_PER_DAY - 1;

/// A time of day on a service day, with minute resolution.
///
/// Values from 24:00 onwards belong to the following calendar day but the
/// same service day.
///
/// # Examples
///
/// ```
/// use journey_planner::domain::ServiceTime;
///
/// let time = ServiceTime::parse_hhmm("14:30").unwrap();
/// assert_eq!(time.to_string(), "14:30");
///
/// let late = ServiceTime::parse_hhmm("24:10").unwrap();
/// assert!(late.is_next_day());
/// assert_eq!(late.to_string(), "00:10+1");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceTime(u16);

impl ServiceTime {
    /// Midnight at the start of the service day.
    pub const MIDNIGHT: ServiceTime = ServiceTime(0);

    /// Latest time a service day can express.
    pub const MAX: ServiceTime = ServiceTime(MAX_MINUTES);

    /// Create a time from hours and minutes.
    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, TimeError> {
        if hour > 47 {
            return Err(TimeError::new("hour must be 0-47"));
        }
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        Ok(Self((hour * 60 + minute) as u16))
    }

    /// Create a time from minutes since the start of the service day.
    pub fn from_minutes(minutes: u16) -> Result<Self, TimeError> {
        if minutes > MAX_MINUTES {
            return Err(TimeError::new("time beyond end of service day"));
        }
        Ok(Self(minutes))
    }

    /// Parse a time from "HH:MM" or "HH:MM:SS" format.
    ///
    /// Seconds are accepted for GTFS compatibility and truncated.
    ///
    /// ```
    /// use journey_planner::domain::ServiceTime;
    ///
    /// assert!(ServiceTime::parse_hhmm("00:00").is_ok());
    /// assert!(ServiceTime::parse_hhmm("25:15:00").is_ok());
    ///
    /// assert!(ServiceTime::parse_hhmm("1430").is_err());
    /// assert!(ServiceTime::parse_hhmm("14:3").is_err());
    /// assert!(ServiceTime::parse_hhmm("48:00").is_err());
    /// ```
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();

        if bytes.len() != 5 && bytes.len() != 8 {
            return Err(TimeError::new("expected HH:MM format"));
        }
        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;

        if bytes.len() == 8 {
            if bytes[5] != b':' {
                return Err(TimeError::new("expected colon at position 5"));
            }
            let second = parse_two_digits(&bytes[6..8])
                .ok_or_else(|| TimeError::new("invalid second digits"))?;
            if second > 59 {
                return Err(TimeError::new("second must be 0-59"));
            }
        }

        Self::from_hm(hour, minute)
    }

    /// Returns minutes since the start of the service day.
    pub fn minutes(&self) -> u16 {
        self.0
    }

    /// Returns the hour on the service day (0-47).
    pub fn hour(&self) -> u32 {
        u32::from(self.0 / 60)
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        u32::from(self.0 % 60)
    }

    /// True if this time falls on the calendar day after the service day.
    pub fn is_next_day(&self) -> bool {
        self.0 >= MINUTES_PER_DAY
    }

    /// Add a duration, returning `None` past the end of the service day
    /// or before its start.
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        let total = i64::from(self.0) + duration.num_minutes();
        if (0..=i64::from(MAX_MINUTES)).contains(&total) {
            Some(Self(total as u16))
        } else {
            None
        }
    }

    /// Subtract a duration, returning `None` before the start of the service day.
    pub fn checked_sub(&self, duration: Duration) -> Option<Self> {
        self.checked_add(-duration)
    }

    /// Add a duration, clamping to the service day.
    pub fn saturating_add(&self, duration: Duration) -> Self {
        let total = i64::from(self.0) + duration.num_minutes();
        Self(total.clamp(0, i64::from(MAX_MINUTES)) as u16)
    }

    /// Subtract a duration, clamping to the service day.
    pub fn saturating_sub(&self, duration: Duration) -> Self {
        self.saturating_add(-duration)
    }

    /// Returns the duration between two times.
    ///
    /// Negative if `other` is after `self`.
    pub fn signed_duration_since(&self, other: Self) -> Duration {
        Duration::minutes(i64::from(self.0) - i64::from(other.0))
    }

    /// Place this time on a calendar, given the service day's date.
    ///
    /// ```
    /// use journey_planner::domain::ServiceTime;
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    /// let late = ServiceTime::parse_hhmm("24:30").unwrap();
    /// let at = late.on_date(date);
    /// assert_eq!(at.date(), NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
    /// ```
    pub fn on_date(&self, service_day: NaiveDate) -> NaiveDateTime {
        service_day.and_time(NaiveTime::MIN) + Duration::minutes(i64::from(self.0))
    }
}

impl fmt::Debug for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceTime({:02}:{:02})", self.hour(), self.minute())
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_next_day() {
            write!(f, "{:02}:{:02}+1", self.hour() - 24, self.minute())
        } else {
            write!(f, "{:02}:{:02}", self.hour(), self.minute())
        }
    }
}

impl TryFrom<String> for ServiceTime {
    type Error = TimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hhmm(&value)
    }
}

impl From<ServiceTime> for String {
    fn from(value: ServiceTime) -> Self {
        format!("{:02}:{:02}", value.hour(), value.minute())
    }
}

/// An inclusive window of service times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub begin: ServiceTime,
    pub end: ServiceTime,
}

impl TimeRange {
    /// Create a window; the bounds are swapped if given in reverse.
    pub fn new(begin: ServiceTime, end: ServiceTime) -> Self {
        if end < begin {
            Self {
                begin: end,
                end: begin,
            }
        } else {
            Self { begin, end }
        }
    }

    /// The whole service day.
    pub fn whole_day() -> Self {
        Self::new(ServiceTime::MIDNIGHT, ServiceTime::MAX)
    }

    /// True if `time` lies within the window, bounds included.
    pub fn contains(&self, time: ServiceTime) -> bool {
        self.begin <= time && time <= self.end
    }

    /// True if the two windows share at least one minute.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.begin <= other.end && other.begin <= self.end
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}
