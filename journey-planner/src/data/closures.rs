//! Temporary station closures.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{DateRange, StationId};

/// A set of stations closed over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationClosure {
    pub stations: BTreeSet<StationId>,
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

impl StationClosure {
    pub fn new(stations: impl IntoIterator<Item = StationId>, begin: NaiveDate, end: NaiveDate) -> Self {
        Self {
            stations: stations.into_iter().collect(),
            begin,
            end,
        }
    }

    pub fn dates(&self) -> DateRange {
        DateRange::new(self.begin, self.end)
    }
}

/// Closure lookup by station.
#[derive(Debug, Clone, Default)]
pub struct Closures {
    by_station: BTreeMap<StationId, Vec<DateRange>>,
}

impl Closures {
    pub fn new<'a>(closures: impl IntoIterator<Item = &'a StationClosure>) -> Self {
        let mut by_station: BTreeMap<StationId, Vec<DateRange>> = BTreeMap::new();
        for closure in closures {
            let dates = closure.dates();
            for station in &closure.stations {
                by_station.entry(station.clone()).or_default().push(dates);
            }
        }
        Self { by_station }
    }

    /// True if `station` is closed on `date`.
    pub fn is_closed(&self, station: &StationId, date: NaiveDate) -> bool {
        self.by_station
            .get(station)
            .is_some_and(|ranges| ranges.iter().any(|r| r.contains(date)))
    }

    /// Every station closed on `date`.
    pub fn closed_on(&self, date: NaiveDate) -> BTreeSet<StationId> {
        self.by_station
            .iter()
            .filter(|(_, ranges)| ranges.iter().any(|r| r.contains(date)))
            .map(|(station, _)| station.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.by_station.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn sid(s: &str) -> StationId {
        StationId::parse(s).unwrap()
    }

    #[test]
    fn closed_within_range_only() {
        let closure = StationClosure::new([sid("Interchange")], date(14), date(15));
        let closures = Closures::new([&closure]);
        assert!(!closures.is_closed(&sid("Interchange"), date(13)));
        assert!(closures.is_closed(&sid("Interchange"), date(14)));
        assert!(closures.is_closed(&sid("Interchange"), date(15)));
        assert!(!closures.is_closed(&sid("Interchange"), date(16)));
        assert!(!closures.is_closed(&sid("First"), date(14)));
    }

    #[test]
    fn closed_on_date() {
        let a = StationClosure::new([sid("A"), sid("B")], date(1), date(10));
        let b = StationClosure::new([sid("C")], date(5), date(5));
        let closures = Closures::new([&a, &b]);
        assert_eq!(closures.closed_on(date(5)).len(), 3);
        assert_eq!(closures.closed_on(date(6)).len(), 2);
        assert!(closures.closed_on(date(11)).is_empty());
    }

    #[test]
    fn deserialize() {
        let json = r#"{"stations":["Interchange"],"begin":"2024-03-14","end":"2024-03-14"}"#;
        let closure: StationClosure = serde_json::from_str(json).unwrap();
        assert_eq!(closure.dates(), DateRange::single(date(14)));
    }
}
