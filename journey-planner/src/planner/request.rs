//! Journey requests.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Duration, NaiveDate};

use crate::domain::{LatLong, PostcodeId, ServiceTime, StationGroupId, StationId, TransportMode};

use super::{SearchConfig, SearchError};

/// A journey origin or destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Station(StationId),
    /// A composite station; any member will do.
    Group(StationGroupId),
    /// A raw position, reached on foot from nearby stations.
    Coordinate(LatLong),
    /// A postcode centroid, treated like a coordinate.
    Postcode(PostcodeId),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Station(id) => write!(f, "station {id}"),
            Location::Group(id) => write!(f, "group {id}"),
            Location::Coordinate(p) => write!(f, "({:.5}, {:.5})", p.lat(), p.lon()),
            Location::Postcode(id) => write!(f, "postcode {id}"),
        }
    }
}

impl From<StationId> for Location {
    fn from(value: StationId) -> Self {
        Location::Station(value)
    }
}

impl From<LatLong> for Location {
    fn from(value: LatLong) -> Self {
        Location::Coordinate(value)
    }
}

/// What the user asked for. Built once per query and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JourneyRequest {
    pub origin: Location,
    pub destination: Location,
    pub date: NaiveDate,
    /// Depart at or after this time, or arrive by it when `arrive_by` is set.
    pub time: ServiceTime,
    pub arrive_by: bool,
    /// Signed so that a negative value can be rejected rather than wrapped.
    pub max_changes: i32,
    pub max_duration: Duration,
    pub modes: BTreeSet<TransportMode>,
    /// Most stations linked on foot to a coordinate endpoint. The network's
    /// walking configuration caps this, and applies alone when unset.
    pub max_walking_connections: Option<usize>,
}

impl JourneyRequest {
    /// A depart-after request with limits taken from `config`.
    pub fn new(
        origin: impl Into<Location>,
        destination: impl Into<Location>,
        date: NaiveDate,
        time: ServiceTime,
        config: &SearchConfig,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            date,
            time,
            arrive_by: false,
            max_changes: i32::try_from(config.max_changes).unwrap_or(i32::MAX),
            max_duration: config.max_journey(),
            modes: TransportMode::all_vehicles(),
            max_walking_connections: None,
        }
    }

    /// Arrive by `time` instead of departing after it.
    pub fn arriving_by(mut self) -> Self {
        self.arrive_by = true;
        self
    }

    pub fn with_max_changes(mut self, max_changes: i32) -> Self {
        self.max_changes = max_changes;
        self
    }

    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub fn with_modes(mut self, modes: impl IntoIterator<Item = TransportMode>) -> Self {
        self.modes = modes.into_iter().collect();
        self
    }

    pub fn with_max_walking_connections(mut self, max: usize) -> Self {
        self.max_walking_connections = Some(max);
        self
    }

    /// Check the parameters that need no network to validate.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_changes < 0 {
            return Err(SearchError::InvalidRequest(
                "max changes must not be negative".to_string(),
            ));
        }
        if self.max_duration <= Duration::zero() {
            return Err(SearchError::InvalidRequest(
                "max duration must be positive".to_string(),
            ));
        }
        if self.modes.is_empty() {
            return Err(SearchError::InvalidRequest(
                "at least one transport mode is required".to_string(),
            ));
        }
        if self.origin == self.destination {
            return Err(SearchError::InvalidRequest(
                "origin and destination are the same".to_string(),
            ));
        }
        Ok(())
    }

    /// Candidate start times, in the order their results are merged.
    ///
    /// Depart-after: the requested time, then `number_of_queries - 1` later
    /// times `query_interval` apart. Arrive-by: times `query_interval` apart
    /// counting back from the target, down to `max_duration` before it.
    /// Times that would fall outside the service day are dropped.
    pub fn candidate_times(&self, config: &SearchConfig) -> Vec<ServiceTime> {
        let interval = config.query_interval();
        if self.arrive_by {
            let steps = (self.max_duration.num_minutes() / config.query_interval_mins.max(1)).max(1);
            (1..=steps)
                .filter_map(|k| self.time.checked_sub(interval * k as i32))
                .collect()
        } else {
            (0..config.number_of_queries)
                .filter_map(|k| self.time.checked_add(interval * k as i32))
                .collect()
        }
    }

    /// The change limit to search with: the request's, capped by config.
    pub fn effective_max_changes(&self, config: &SearchConfig) -> u32 {
        u32::try_from(self.max_changes)
            .unwrap_or(0)
            .min(config.max_changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ServiceTime {
        ServiceTime::parse_hhmm(s).unwrap()
    }

    fn request() -> JourneyRequest {
        JourneyRequest::new(
            StationId::parse("First").unwrap(),
            StationId::parse("Last").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            t("08:00"),
            &SearchConfig::default(),
        )
    }

    #[test]
    fn defaults_from_config() {
        let request = request();
        assert!(!request.arrive_by);
        assert_eq!(request.max_changes, 3);
        assert_eq!(request.max_duration, Duration::minutes(124));
        assert_eq!(request.modes.len(), 5);
        request.validate().unwrap();
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(
            request().with_max_changes(-1).validate(),
            Err(SearchError::InvalidRequest(_))
        ));
        assert!(matches!(
            request().with_max_duration(Duration::zero()).validate(),
            Err(SearchError::InvalidRequest(_))
        ));
        assert!(matches!(
            request().with_modes([]).validate(),
            Err(SearchError::InvalidRequest(_))
        ));

        let mut same = request();
        same.destination = same.origin.clone();
        assert!(matches!(same.validate(), Err(SearchError::InvalidRequest(_))));
    }

    #[test]
    fn depart_after_candidates() {
        let times = request().candidate_times(&SearchConfig::default());
        assert_eq!(times, vec![t("08:00"), t("08:12"), t("08:24")]);
    }

    #[test]
    fn arrive_by_candidates_count_back() {
        let request = request()
            .arriving_by()
            .with_max_duration(Duration::minutes(40));
        let times = request.candidate_times(&SearchConfig::default());
        assert_eq!(times, vec![t("07:48"), t("07:36"), t("07:24")]);
    }

    #[test]
    fn candidates_stay_within_service_day() {
        let mut early = request().arriving_by();
        early.time = t("00:20");
        let times = early.candidate_times(&SearchConfig::default());
        assert_eq!(times, vec![t("00:08")]);
    }

    #[test]
    fn change_limit_is_capped() {
        let config = SearchConfig {
            max_changes: 2,
            ..SearchConfig::default()
        };
        assert_eq!(request().with_max_changes(5).effective_max_changes(&config), 2);
        assert_eq!(request().with_max_changes(0).effective_max_changes(&config), 0);
    }
}
