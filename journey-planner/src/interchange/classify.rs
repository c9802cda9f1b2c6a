use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::{debug, info, warn};

use crate::config::InterchangeConfig;
use crate::data::TransportData;
use crate::domain::{RouteId, Station, StationId};
use crate::locations::Neighbours;

/// Why a station is an interchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InterchangeType {
    /// Flagged in the source feed.
    FromSourceData,
    /// Served by enough routes.
    NumberOfLinks,
    /// Has walking neighbours whose routes can be reached from here.
    NeighbourLinks,
    /// Served by more than one transport mode.
    MultipleModes,
    /// Forced by configuration.
    FromConfig,
}

impl fmt::Display for InterchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InterchangeType::FromSourceData => "from source data",
            InterchangeType::NumberOfLinks => "number of links",
            InterchangeType::NeighbourLinks => "neighbour links",
            InterchangeType::MultipleModes => "multiple modes",
            InterchangeType::FromConfig => "from config",
        };
        f.write_str(name)
    }
}

/// A station where changing routes is allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterchangeStation {
    pub station: StationId,
    pub kind: InterchangeType,
    pub pickup_routes: BTreeSet<RouteId>,
    pub dropoff_routes: BTreeSet<RouteId>,
    /// Neighbours reachable on foot from here.
    pub linked_stations: BTreeSet<StationId>,
    /// Routes boardable at those neighbours.
    pub linked_routes: BTreeSet<RouteId>,
}

impl InterchangeStation {
    fn new(station: &Station, kind: InterchangeType) -> Self {
        Self {
            station: station.id.clone(),
            kind,
            pickup_routes: station.pickup_routes.clone(),
            dropoff_routes: station.dropoff_routes.clone(),
            linked_stations: BTreeSet::new(),
            linked_routes: BTreeSet::new(),
        }
    }

    /// Routes that can be boarded when changing here, on foot or not.
    pub fn reachable_routes(&self) -> BTreeSet<RouteId> {
        self.pickup_routes.union(&self.linked_routes).cloned().collect()
    }
}

/// The set of interchange stations.
#[derive(Debug, Clone, Default)]
pub struct Interchanges {
    by_station: BTreeMap<StationId, InterchangeStation>,
    change_anywhere: bool,
}

impl Interchanges {
    /// Classify every station.
    ///
    /// Steps run in a fixed order over stations in id order, so the result
    /// depends only on the data and configuration: source flags, then route
    /// count, then neighbour links, then multiple modes, then configured
    /// additions and finally configured removals. The first step to match a
    /// station sets its type, except that a configured addition always
    /// reports [`InterchangeType::FromConfig`].
    ///
    /// With `change_anywhere`, every station counts as an interchange for
    /// [`is_interchange`](Self::is_interchange) regardless of classification.
    pub fn classify(
        data: &TransportData,
        neighbours: &Neighbours,
        config: &InterchangeConfig,
        change_anywhere: bool,
    ) -> Self {
        let mut by_station: BTreeMap<StationId, InterchangeStation> = BTreeMap::new();

        for station in data.stations().filter(|s| s.marked_interchange) {
            by_station.insert(
                station.id.clone(),
                InterchangeStation::new(station, InterchangeType::FromSourceData),
            );
        }

        for station in data.stations() {
            if station.all_routes().len() >= config.min_route_links {
                by_station
                    .entry(station.id.clone())
                    .or_insert_with(|| InterchangeStation::new(station, InterchangeType::NumberOfLinks));
            }
        }

        if config.include_neighbour_links {
            for station in data.stations() {
                for (neighbour_id, _) in neighbours.neighbours_of(&station.id) {
                    let Some(neighbour) = data.station(neighbour_id) else {
                        continue;
                    };
                    let entry = by_station
                        .entry(station.id.clone())
                        .or_insert_with(|| InterchangeStation::new(station, InterchangeType::NeighbourLinks));
                    entry.linked_stations.insert(neighbour.id.clone());
                    entry.linked_routes.extend(neighbour.pickup_routes.iter().cloned());
                }
            }
        }

        if config.include_multi_mode {
            for station in data.stations().filter(|s| s.modes.len() > 1) {
                by_station
                    .entry(station.id.clone())
                    .or_insert_with(|| InterchangeStation::new(station, InterchangeType::MultipleModes));
            }
        }

        for id in &config.force_add {
            let Some(station) = data.station(id) else {
                warn!(station = %id, "Configured interchange is not a known station");
                continue;
            };
            by_station
                .entry(id.clone())
                .and_modify(|existing| existing.kind = InterchangeType::FromConfig)
                .or_insert_with(|| InterchangeStation::new(station, InterchangeType::FromConfig));
        }

        for id in &config.force_remove {
            if by_station.remove(id).is_some() {
                debug!(station = %id, "Interchange removed by configuration");
            }
        }

        info!(
            interchanges = by_station.len(),
            change_anywhere, "Interchanges classified"
        );

        Self {
            by_station,
            change_anywhere,
        }
    }

    /// True if changing routes is allowed at `station`.
    pub fn is_interchange(&self, station: &StationId) -> bool {
        self.change_anywhere || self.by_station.contains_key(station)
    }

    /// True if every station counts as an interchange.
    pub fn change_anywhere(&self) -> bool {
        self.change_anywhere
    }

    /// The classified record for `station`, if it was classified.
    pub fn get(&self, station: &StationId) -> Option<&InterchangeStation> {
        self.by_station.get(station)
    }

    /// Classified interchanges in station id order.
    pub fn iter(&self) -> impl Iterator<Item = &InterchangeStation> {
        self.by_station.values()
    }

    pub fn len(&self) -> usize {
        self.by_station.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_station.is_empty()
    }
}
