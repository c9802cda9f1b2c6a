//! Walking links between nearby stations.
//!
//! Some stations are close enough to walk between, giving connections that
//! no timetable shows. Links come from station locations (when enabled) and
//! from explicitly configured pairs.

use std::collections::BTreeMap;

use chrono::Duration;
use tracing::{info, warn};

use crate::config::WalkingConfig;
use crate::data::TransportData;
use crate::domain::StationId;

use super::{StationLocations, walking_cost};

/// Walking links between stations.
///
/// Links are symmetric: if you can walk from A to B, you can walk from B to A
/// in the same time.
#[derive(Debug, Clone, Default)]
pub struct Neighbours {
    /// Walk duration in minutes, stored in both directions.
    links: BTreeMap<StationId, BTreeMap<StationId, i64>>,
}

impl Neighbours {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive links from the network and walking configuration.
    ///
    /// With `create_neighbours` set, every pair of stations within
    /// `neighbour_distance_m` is linked. Configured `additional_links` are
    /// always added; pairs naming an unknown station are skipped.
    pub fn build(data: &TransportData, locations: &StationLocations, config: &WalkingConfig) -> Self {
        let mut neighbours = Self::new();

        if config.create_neighbours {
            for station in data.stations() {
                for near in locations.find_near(&station.location, config.neighbour_distance_m) {
                    if near.id != station.id {
                        let cost = walking_cost(near.distance_m, config.walking_speed_mph);
                        neighbours.add(station.id.clone(), near.id, cost.num_minutes());
                    }
                }
            }
        }

        for (from, to) in &config.additional_links {
            let (Some(a), Some(b)) = (data.station(from), data.station(to)) else {
                warn!(from = %from, to = %to, "Skipping neighbour link to unknown station");
                continue;
            };
            if a.id == b.id {
                continue;
            }
            let cost = walking_cost(a.location.distance_to(&b.location), config.walking_speed_mph);
            neighbours.add(a.id.clone(), b.id.clone(), cost.num_minutes());
        }

        info!(links = neighbours.len(), "Station neighbours built");
        neighbours
    }

    /// Add a link between two stations, stored in both directions.
    pub fn add(&mut self, from: StationId, to: StationId, duration_minutes: i64) {
        self.links
            .entry(from.clone())
            .or_default()
            .insert(to.clone(), duration_minutes);
        self.links.entry(to).or_default().insert(from, duration_minutes);
    }

    /// Get the walk duration between two stations, if they are neighbours.
    pub fn get(&self, from: &StationId, to: &StationId) -> Option<Duration> {
        self.links
            .get(from)
            .and_then(|m| m.get(to))
            .map(|mins| Duration::minutes(*mins))
    }

    /// Check if two stations are neighbours.
    pub fn are_neighbours(&self, from: &StationId, to: &StationId) -> bool {
        self.get(from, to).is_some()
    }

    /// Get all neighbours of a station, in id order.
    pub fn neighbours_of<'a>(
        &'a self,
        from: &StationId,
    ) -> impl Iterator<Item = (&'a StationId, Duration)> + 'a {
        self.links
            .get(from)
            .into_iter()
            .flatten()
            .map(|(to, mins)| (to, Duration::minutes(*mins)))
    }

    /// True if the station has at least one neighbour.
    pub fn has_neighbours(&self, station: &StationId) -> bool {
        self.links.get(station).is_some_and(|m| !m.is_empty())
    }

    /// Every link once, as (lower id, higher id, duration).
    pub fn pairs(&self) -> impl Iterator<Item = (&StationId, &StationId, Duration)> {
        self.links.iter().flat_map(|(from, tos)| {
            tos.iter()
                .filter(move |(to, _)| from < *to)
                .map(move |(to, mins)| (from, to, Duration::minutes(*mins)))
        })
    }

    /// Returns the number of linked pairs (counting A→B and B→A as one).
    pub fn len(&self) -> usize {
        self.links.values().map(BTreeMap::len).sum::<usize>() / 2
    }

    /// Returns true if there are no links.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Builder for creating neighbour links.
///
/// Provides a fluent API for adding links by station id string.
#[derive(Debug, Default)]
pub struct NeighboursBuilder {
    inner: Neighbours,
}

impl NeighboursBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a link; ids that fail to parse are ignored.
    pub fn add(mut self, from: &str, to: &str, duration_minutes: i64) -> Self {
        if let (Ok(from), Ok(to)) = (StationId::parse(from), StationId::parse(to)) {
            self.inner.add(from, to, duration_minutes);
        }
        self
    }

    /// Build the neighbour links.
    pub fn build(self) -> Neighbours {
        self.inner
    }
}
