use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::RouteCostConfig;
use crate::data::TransportData;
use crate::domain::{RouteId, RouteStationId, StationId, TimeRange};
use crate::interchange::Interchanges;
use crate::locations::Neighbours;

use super::DestinationHops;

/// Stored for route pairs with no connection.
pub(super) const UNREACHABLE: u8 = u8::MAX;

/// Fewest and most changes seen across sampled dates and times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberOfChanges {
    pub min: usize,
    pub max: usize,
}

/// All-pairs minimum changes between routes.
///
/// Route R1 connects to R2 if R1 sets down and R2 picks up at the same
/// interchange, or at two neighbouring stations at least one of which is an
/// interchange. Connections are directional.
#[derive(Debug, Clone)]
pub struct RouteToRouteCosts {
    index: BTreeMap<RouteId, usize>,
    routes: Vec<RouteId>,
    adjacency: Vec<BTreeSet<usize>>,
    hops: Vec<Vec<u8>>,
}

impl RouteToRouteCosts {
    pub fn build(data: &TransportData, interchanges: &Interchanges, neighbours: &Neighbours) -> Self {
        let routes: Vec<RouteId> = data.routes().map(|r| r.id.clone()).collect();
        let index: BTreeMap<RouteId, usize> = routes
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        let mut adjacency = vec![BTreeSet::new(); routes.len()];

        let mut connect = |from: &BTreeSet<RouteId>, to: &BTreeSet<RouteId>| {
            for a in from.iter().filter_map(|r| index.get(r)) {
                for b in to.iter().filter_map(|r| index.get(r)) {
                    if a != b {
                        adjacency[*a].insert(*b);
                    }
                }
            }
        };

        for station in data.stations() {
            let here = interchanges.is_interchange(&station.id);
            if here {
                connect(&station.dropoff_routes, &station.pickup_routes);
            }
            for (neighbour_id, _) in neighbours.neighbours_of(&station.id) {
                let Some(neighbour) = data.station(neighbour_id) else {
                    continue;
                };
                if here || interchanges.is_interchange(neighbour_id) {
                    connect(&station.dropoff_routes, &neighbour.pickup_routes);
                }
            }
        }

        let hops: Vec<Vec<u8>> = (0..routes.len())
            .map(|start| bfs(&adjacency, &[start], |_| true))
            .collect();

        let links: usize = adjacency.iter().map(BTreeSet::len).sum();
        info!(routes = routes.len(), links, "Route to route costs built");

        Self {
            index,
            routes,
            adjacency,
            hops,
        }
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Fewest changes to get from route `a` to route `b`.
    ///
    /// `Some(0)` for the same route; `None` if `b` cannot be reached from
    /// `a` or either route is unknown.
    pub fn get_for(&self, a: &RouteId, b: &RouteId) -> Option<usize> {
        let (a, b) = (self.index.get(a)?, self.index.get(b)?);
        hop_count(self.hops[*a][*b])
    }

    /// Fewest changes from any route in `from` to any route in `to`.
    pub fn min_between(&self, from: &BTreeSet<RouteId>, to: &BTreeSet<RouteId>) -> Option<usize> {
        from.iter()
            .flat_map(|a| to.iter().filter_map(move |b| self.get_for(a, b)))
            .min()
    }

    /// Lower bounds on changes from each route to any of `destinations`.
    pub fn hops_to(&self, destinations: &BTreeSet<RouteId>) -> DestinationHops {
        let targets: Vec<usize> = destinations
            .iter()
            .filter_map(|r| self.index.get(r).copied())
            .collect();
        let min = self
            .hops
            .iter()
            .map(|row| {
                targets
                    .iter()
                    .map(|t| row[*t])
                    .min()
                    .unwrap_or(UNREACHABLE)
            })
            .collect();
        DestinationHops::new(self.index.clone(), min)
    }

    /// Fewest changes from the route at `route_station` to any route that
    /// sets down at one of `destinations`.
    pub fn hops_calculator(
        &self,
        data: &TransportData,
        route_station: &RouteStationId,
        destinations: &BTreeSet<StationId>,
    ) -> Option<usize> {
        let targets = dropoff_routes(data, destinations);
        self.hops_to(&targets).min_hops(&route_station.route)
    }

    /// Fewest changes from `from` routes to `to` routes using only routes
    /// running on `date` during `window`.
    pub fn number_of_changes_on(
        &self,
        data: &TransportData,
        from: &BTreeSet<RouteId>,
        to: &BTreeSet<RouteId>,
        date: NaiveDate,
        window: &TimeRange,
    ) -> Option<usize> {
        let available: Vec<bool> = self
            .routes
            .iter()
            .map(|r| data.route_runs_during(r, date, window))
            .collect();
        let starts: Vec<usize> = from
            .iter()
            .filter_map(|r| self.index.get(r).copied())
            .filter(|i| available[*i])
            .collect();
        if starts.is_empty() {
            return None;
        }
        let reached = bfs(&self.adjacency, &starts, |i| available[i]);
        to.iter()
            .filter_map(|r| self.index.get(r))
            .filter_map(|i| hop_count(reached[*i]))
            .min()
    }

    /// Fewest and most changes between two station sets, sampled over the
    /// configured dates and time windows.
    ///
    /// Samples where no connection exists do not count towards the maximum.
    /// `None` if no sample connects them.
    pub fn number_of_changes(
        &self,
        data: &TransportData,
        from: &BTreeSet<StationId>,
        to: &BTreeSet<StationId>,
        config: &RouteCostConfig,
    ) -> Option<NumberOfChanges> {
        let from_routes = pickup_routes(data, from);
        let to_routes = dropoff_routes(data, to);
        let range = data.date_range()?;
        let step = config.sample_every_days.max(1) as usize;

        let mut result: Option<NumberOfChanges> = None;
        for date in range.days().step_by(step) {
            for window in &config.sample_windows {
                let Some(changes) = self.number_of_changes_on(data, &from_routes, &to_routes, date, window)
                else {
                    continue;
                };
                result = Some(match result {
                    None => NumberOfChanges {
                        min: changes,
                        max: changes,
                    },
                    Some(seen) => NumberOfChanges {
                        min: seen.min.min(changes),
                        max: seen.max.max(changes),
                    },
                });
            }
        }
        debug!(?result, "Sampled number of changes");
        result
    }
}

/// Routes that can be boarded at any of `stations`.
pub(crate) fn pickup_routes(data: &TransportData, stations: &BTreeSet<StationId>) -> BTreeSet<RouteId> {
    stations
        .iter()
        .filter_map(|s| data.station(s))
        .flat_map(|s| s.pickup_routes.iter().cloned())
        .collect()
}

/// Routes that set down at any of `stations`.
pub(crate) fn dropoff_routes(data: &TransportData, stations: &BTreeSet<StationId>) -> BTreeSet<RouteId> {
    stations
        .iter()
        .filter_map(|s| data.station(s))
        .flat_map(|s| s.dropoff_routes.iter().cloned())
        .collect()
}

fn hop_count(hops: u8) -> Option<usize> {
    (hops != UNREACHABLE).then_some(hops as usize)
}

/// Breadth-first hop counts from `starts` over routes allowed by `allowed`.
fn bfs(adjacency: &[BTreeSet<usize>], starts: &[usize], allowed: impl Fn(usize) -> bool) -> Vec<u8> {
    let mut hops = vec![UNREACHABLE; adjacency.len()];
    let mut queue = VecDeque::new();
    for start in starts {
        hops[*start] = 0;
        queue.push_back(*start);
    }
    while let Some(current) = queue.pop_front() {
        let next = hops[current].saturating_add(1).min(UNREACHABLE - 1);
        for neighbour in &adjacency[current] {
            if hops[*neighbour] == UNREACHABLE && allowed(*neighbour) {
                hops[*neighbour] = next;
                queue.push_back(*neighbour);
            }
        }
    }
    hops
}
