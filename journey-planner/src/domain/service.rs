//! Service calendars.
//!
//! A `Service` says on which dates its trips run: a weekday pattern over a
//! validity range, plus dates explicitly added or removed.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::ServiceId;

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range; the bounds are swapped if given in reverse.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    /// A range covering a single day.
    pub fn single(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &DateRange) -> DateRange {
        DateRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Every date in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }

    /// Number of days in the range.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// A set of weekdays.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct DaysOfWeek(u8);

impl DaysOfWeek {
    /// Monday to Friday.
    pub const WEEKDAYS: DaysOfWeek = DaysOfWeek(0b0001_1111);

    /// Every day.
    pub const ALL: DaysOfWeek = DaysOfWeek(0b0111_1111);

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Weekday> for DaysOfWeek {
    fn from_iter<T: IntoIterator<Item = Weekday>>(iter: T) -> Self {
        let mut days = DaysOfWeek::empty();
        for day in iter {
            days.insert(day);
        }
        days
    }
}

impl From<Vec<Weekday>> for DaysOfWeek {
    fn from(value: Vec<Weekday>) -> Self {
        value.into_iter().collect()
    }
}

impl From<DaysOfWeek> for Vec<Weekday> {
    fn from(value: DaysOfWeek) -> Self {
        let mut day = Weekday::Mon;
        let mut days = Vec::new();
        for _ in 0..7 {
            if value.contains(day) {
                days.push(day);
            }
            day = day.succ();
        }
        days
    }
}

impl std::fmt::Debug for DaysOfWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let days: Vec<Weekday> = (*self).into();
        f.debug_set().entries(days).finish()
    }
}

/// Calendar of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub range: DateRange,
    pub days: DaysOfWeek,
    /// Dates the service runs regardless of the weekday pattern.
    #[serde(default)]
    pub additional: BTreeSet<NaiveDate>,
    /// Dates the service does not run, overriding everything else.
    #[serde(default)]
    pub excluded: BTreeSet<NaiveDate>,
}

impl Calendar {
    pub fn new(range: DateRange, days: DaysOfWeek) -> Self {
        Self {
            range,
            days,
            additional: BTreeSet::new(),
            excluded: BTreeSet::new(),
        }
    }

    /// True if the service runs on `date`.
    ///
    /// ```
    /// use journey_planner::domain::{Calendar, DateRange, DaysOfWeek};
    /// use chrono::NaiveDate;
    ///
    /// let start = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(); // Monday
    /// let end = NaiveDate::from_ymd_opt(2024, 3, 24).unwrap();
    /// let calendar = Calendar::new(DateRange::new(start, end), DaysOfWeek::WEEKDAYS);
    ///
    /// assert!(calendar.operates_on(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()));
    /// assert!(!calendar.operates_on(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()));
    /// assert!(!calendar.operates_on(NaiveDate::from_ymd_opt(2024, 3, 25).unwrap()));
    /// ```
    pub fn operates_on(&self, date: NaiveDate) -> bool {
        if self.excluded.contains(&date) {
            return false;
        }
        if self.additional.contains(&date) {
            return true;
        }
        self.range.contains(date) && self.days.contains(date.weekday())
    }

    /// True if there is at least one date the service runs.
    pub fn has_any_day(&self) -> bool {
        if self.additional.iter().any(|d| !self.excluded.contains(d)) {
            return true;
        }
        if self.days.is_empty() {
            return false;
        }
        self.range.days().any(|d| self.operates_on(d))
    }

    /// The range spanning every date the service could run.
    pub fn span(&self) -> DateRange {
        let mut span = self.range;
        for date in &self.additional {
            span = span.union(&DateRange::single(*date));
        }
        span
    }
}

/// A calendar shared by one or more trips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub calendar: Calendar,
}

impl Service {
    pub fn new(id: ServiceId, calendar: Calendar) -> Self {
        Self { id, calendar }
    }

    pub fn operates_on(&self, date: NaiveDate) -> bool {
        self.calendar.operates_on(date)
    }
}
