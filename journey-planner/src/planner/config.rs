//! Search configuration for the journey planner.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Configuration parameters for journey search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Upper bound on changes; requests asking for more are clamped.
    pub max_changes: u32,

    /// Maximum number of journeys to return.
    pub max_results: usize,

    /// Number of candidate start times searched per request.
    pub number_of_queries: usize,

    /// Gap between candidate start times (minutes).
    pub query_interval_mins: i64,

    /// Default maximum total journey time (minutes).
    pub max_journey_mins: i64,

    /// Longest wait for the first vehicle after a candidate start time
    /// (minutes).
    pub max_initial_wait_mins: i64,

    /// Minimum time between alighting and boarding a different route
    /// (minutes).
    pub min_change_mins: i64,

    /// Only allow changing between routes at interchange stations.
    pub change_at_interchange_only: bool,

    /// States popped per candidate search before giving up on it.
    pub max_states: usize,

    /// Time budget for a whole request (milliseconds).
    pub timeout_ms: u64,
}

impl SearchConfig {
    /// Returns the candidate query interval as a Duration.
    pub fn query_interval(&self) -> Duration {
        Duration::minutes(self.query_interval_mins)
    }

    /// Returns the maximum journey time as a Duration.
    pub fn max_journey(&self) -> Duration {
        Duration::minutes(self.max_journey_mins)
    }

    /// Returns the maximum initial wait as a Duration.
    pub fn max_initial_wait(&self) -> Duration {
        Duration::minutes(self.max_initial_wait_mins)
    }

    /// Returns the minimum change time as a Duration.
    pub fn min_change(&self) -> Duration {
        Duration::minutes(self.min_change_mins)
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_changes: 3,
            max_results: 5,
            number_of_queries: 3,
            query_interval_mins: 12,
            max_journey_mins: 124,
            max_initial_wait_mins: 25,
            min_change_mins: 0,
            change_at_interchange_only: true,
            max_states: 200_000,
            timeout_ms: 5_000,
        }
    }
}
