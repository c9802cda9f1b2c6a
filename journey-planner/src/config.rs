//! Planner configuration.
//!
//! Read once at startup, from JSON. Every section has defaults so a config
//! file only needs the values it changes.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::StationClosure;
use crate::domain::{StationId, TimeRange, TransportMode};
use crate::planner::SearchConfig;

/// Errors loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for this schema
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is out of range
    #[error("invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: &'static str,
    },
}

/// Walking between stations and to or from raw coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkingConfig {
    pub walking_speed_mph: f64,

    /// Radius searched around a coordinate endpoint (metres).
    pub nearest_stops_range_m: f64,

    /// Most stations a coordinate endpoint is linked to.
    pub max_walking_connections: usize,

    /// Stations closer than this are neighbours (metres).
    pub neighbour_distance_m: f64,

    /// Derive neighbours from station locations.
    pub create_neighbours: bool,

    /// Extra neighbour pairs, linked whatever their distance.
    pub additional_links: Vec<(StationId, StationId)>,
}

impl Default for WalkingConfig {
    fn default() -> Self {
        Self {
            walking_speed_mph: 3.0,
            nearest_stops_range_m: 1600.0,
            max_walking_connections: 3,
            neighbour_distance_m: 200.0,
            create_neighbours: false,
            additional_links: Vec::new(),
        }
    }
}

/// How interchange stations are classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterchangeConfig {
    /// Stations served by at least this many routes are interchanges.
    pub min_route_links: usize,

    /// Treat neighbour links as change points.
    pub include_neighbour_links: bool,

    /// Stations served by more than one mode are interchanges.
    pub include_multi_mode: bool,

    pub force_add: BTreeSet<StationId>,

    /// Applied after `force_add`, so a station in both is not an
    /// interchange.
    pub force_remove: BTreeSet<StationId>,
}

impl Default for InterchangeConfig {
    fn default() -> Self {
        Self {
            min_route_links: 3,
            include_neighbour_links: true,
            include_multi_mode: true,
            force_add: BTreeSet::new(),
            force_remove: BTreeSet::new(),
        }
    }
}

/// Which dates and times are sampled for min/max number of changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteCostConfig {
    /// Sample every Nth day of the data's date range.
    pub sample_every_days: u32,

    pub sample_windows: Vec<TimeRange>,
}

impl Default for RouteCostConfig {
    fn default() -> Self {
        Self {
            sample_every_days: 1,
            sample_windows: vec![TimeRange::whole_day()],
        }
    }
}

/// Response cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_capacity: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 60,
            max_capacity: 1000,
        }
    }
}

/// Everything configurable about building the network and searching it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub search: SearchConfig,
    pub walking: WalkingConfig,
    pub interchanges: InterchangeConfig,
    pub route_costs: RouteCostConfig,
    /// Transport modes loaded into the network.
    pub modes: BTreeSet<TransportMode>,
    pub closures: Vec<StationClosure>,
    pub cache: CacheConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            walking: WalkingConfig::default(),
            interchanges: InterchangeConfig::default(),
            route_costs: RouteCostConfig::default(),
            modes: TransportMode::all_vehicles(),
            closures: Vec::new(),
            cache: CacheConfig::default(),
        }
    }
}

impl PlannerConfig {
    /// Parse and validate.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: PlannerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Reject values the planner cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, message: &'static str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid { field, message })
        }

        let search = &self.search;
        if search.number_of_queries == 0 {
            return invalid("search.number_of_queries", "must be at least 1");
        }
        if search.query_interval_mins <= 0 {
            return invalid("search.query_interval_mins", "must be positive");
        }
        if search.max_journey_mins <= 0 {
            return invalid("search.max_journey_mins", "must be positive");
        }
        if search.max_initial_wait_mins < 0 || search.min_change_mins < 0 {
            return invalid("search", "waits must not be negative");
        }
        if search.max_results == 0 {
            return invalid("search.max_results", "must be at least 1");
        }
        if !(self.walking.walking_speed_mph.is_finite() && self.walking.walking_speed_mph > 0.0) {
            return invalid("walking.walking_speed_mph", "must be positive");
        }
        if !(self.walking.nearest_stops_range_m >= 0.0 && self.walking.neighbour_distance_m >= 0.0)
        {
            return invalid("walking", "distances must not be negative");
        }
        if self.route_costs.sample_every_days == 0 {
            return invalid("route_costs.sample_every_days", "must be at least 1");
        }
        if self.route_costs.sample_windows.is_empty() {
            return invalid("route_costs.sample_windows", "must not be empty");
        }
        if self.modes.is_empty() {
            return invalid("modes", "must allow at least one mode");
        }
        if self.modes.contains(&TransportMode::Walk) {
            return invalid("modes", "walk is not a vehicle mode");
        }
        Ok(())
    }
}
