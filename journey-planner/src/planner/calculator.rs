//! Request resolution and candidate orchestration.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use chrono::Duration;
use tracing::{debug, info};

use crate::config::PlannerConfig;
use crate::data::{Closures, TransportData};
use crate::domain::{LatLong, RouteId, ServiceTime, StationId};
use crate::graph::TransitGraph;
use crate::interchange::Interchanges;
use crate::locations::{Neighbours, StationLocations, walking_cost};
use crate::route_costs::{DestinationHops, RouteToRouteCosts};

use super::rank::{RankOrder, merge_candidates};
use super::request::{JourneyRequest, Location};
use super::search::{CancelFlag, CandidateOutcome, CandidateSearch, SearchError, SearchResult};

/// A resolved origin or destination.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Endpoint {
    Stations(BTreeSet<StationId>),
    /// A position and the walking time to each station linked to it.
    Coordinate {
        point: LatLong,
        walks: BTreeMap<StationId, Duration>,
    },
}

impl Endpoint {
    /// Stations the endpoint is reached from or left by.
    pub(crate) fn stations(&self) -> BTreeSet<StationId> {
        match self {
            Endpoint::Stations(stations) => stations.clone(),
            Endpoint::Coordinate { walks, .. } => walks.keys().cloned().collect(),
        }
    }
}

/// A validated request with everything the candidate searches share.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub(crate) request: JourneyRequest,
    pub(crate) origin: Endpoint,
    pub(crate) destination: Endpoint,
    pub(crate) hops: DestinationHops,
    pub(crate) max_changes: u32,
    /// Set for arrive-by requests.
    pub(crate) latest_arrival: Option<ServiceTime>,
    candidates: Vec<ServiceTime>,
}

impl PreparedQuery {
    pub fn request(&self) -> &JourneyRequest {
        &self.request
    }

    /// Candidate start times, in merge order.
    pub fn candidates(&self) -> &[ServiceTime] {
        &self.candidates
    }

    pub fn order(&self) -> RankOrder {
        if self.request.arrive_by {
            RankOrder::ArriveBy
        } else {
            RankOrder::DepartAfter
        }
    }
}

/// Plans journeys over one built network.
///
/// Borrows every part of the network it reads; nothing is mutated during a
/// search, so any number of calculators may run at once.
#[derive(Debug, Clone, Copy)]
pub struct RouteCalculator<'a> {
    pub(crate) data: &'a TransportData,
    pub(crate) graph: &'a TransitGraph,
    pub(crate) interchanges: &'a Interchanges,
    pub(crate) costs: &'a RouteToRouteCosts,
    pub(crate) locations: &'a StationLocations,
    pub(crate) neighbours: &'a Neighbours,
    pub(crate) closures: &'a Closures,
    pub(crate) config: &'a PlannerConfig,
}

impl<'a> RouteCalculator<'a> {
    /// Validate `request` and resolve its endpoints.
    pub fn prepare(&self, request: &JourneyRequest) -> Result<PreparedQuery, SearchError> {
        request.validate()?;
        if !self.data.contains_date(request.date) {
            return Err(SearchError::DateOutOfRange(request.date));
        }

        let max_walks = request.max_walking_connections.unwrap_or(usize::MAX);
        let origin = self.resolve(&request.origin, max_walks)?;
        let destination = self.resolve(&request.destination, max_walks)?;
        let hops = self.costs.hops_to(&self.destination_routes(&destination));

        let search = &self.config.search;
        Ok(PreparedQuery {
            request: request.clone(),
            origin,
            destination,
            hops,
            max_changes: request.effective_max_changes(search),
            latest_arrival: request.arrive_by.then_some(request.time),
            candidates: request.candidate_times(search),
        })
    }

    /// Stations a location stands for: itself, a group's members, or those
    /// within walking range of a coordinate.
    pub fn stations_for(&self, location: &Location) -> Result<BTreeSet<StationId>, SearchError> {
        let endpoint = self.resolve(location, self.config.walking.max_walking_connections)?;
        Ok(endpoint.stations())
    }

    fn resolve(&self, location: &Location, max_walks: usize) -> Result<Endpoint, SearchError> {
        let unknown = || SearchError::UnknownLocation(location.to_string());
        match location {
            Location::Station(id) => {
                self.data.station(id).ok_or_else(unknown)?;
                Ok(Endpoint::Stations(BTreeSet::from([id.clone()])))
            }
            Location::Group(id) => {
                let group = self.data.group(id).ok_or_else(unknown)?;
                Ok(Endpoint::Stations(group.members.clone()))
            }
            Location::Postcode(id) => {
                let postcode = self.data.postcode(id).ok_or_else(unknown)?;
                Ok(self.walks_for(postcode.location, max_walks))
            }
            Location::Coordinate(point) => Ok(self.walks_for(*point, max_walks)),
        }
    }

    fn walks_for(&self, point: LatLong, max_walks: usize) -> Endpoint {
        let walking = &self.config.walking;
        let limit = max_walks.min(walking.max_walking_connections);
        let walks = self
            .locations
            .nearest(&point, walking.nearest_stops_range_m, limit)
            .into_iter()
            .map(|near| (near.id, walking_cost(near.distance_m, walking.walking_speed_mph)))
            .collect::<BTreeMap<_, _>>();
        debug!(lat = point.lat(), lon = point.lon(), stations = walks.len(), "Linked coordinate");
        Endpoint::Coordinate { point, walks }
    }

    /// Routes that can finish a journey: those setting down at a destination
    /// station, or at a neighbour a walk away from one.
    fn destination_routes(&self, destination: &Endpoint) -> BTreeSet<RouteId> {
        let mut stations = destination.stations();
        if let Endpoint::Stations(targets) = destination {
            for target in targets {
                stations.extend(self.neighbours.neighbours_of(target).map(|(id, _)| id.clone()));
            }
        }
        stations
            .iter()
            .filter_map(|s| self.data.station(s))
            .flat_map(|s| s.dropoff_routes.iter().cloned())
            .collect()
    }

    /// Search from one candidate start time.
    pub fn search_candidate(
        &self,
        query: &PreparedQuery,
        start: ServiceTime,
        cancel: &CancelFlag,
        deadline: Option<Instant>,
    ) -> Result<CandidateOutcome, SearchError> {
        CandidateSearch::new(self, query, start, cancel, deadline).run()
    }

    /// Merge per-candidate outcomes, given in candidate order.
    pub fn finish(&self, query: &PreparedQuery, outcomes: Vec<CandidateOutcome>) -> SearchResult {
        let candidates_searched = outcomes.len();
        let states_explored: usize = outcomes.iter().map(|o| o.states_explored).sum();
        let journeys = merge_candidates(
            outcomes.into_iter().map(|o| o.journeys),
            query.order(),
            self.config.search.max_results,
        );
        info!(
            origin = %query.request.origin,
            destination = %query.request.destination,
            journeys = journeys.len(),
            states_explored,
            "Journey search complete"
        );
        SearchResult {
            journeys,
            states_explored,
            candidates_searched,
        }
    }

    /// Plan `request`, running each candidate in turn on this thread.
    pub fn calculate(&self, request: &JourneyRequest, cancel: &CancelFlag) -> Result<SearchResult, SearchError> {
        let query = self.prepare(request)?;
        let deadline = Instant::now() + self.config.search.timeout();
        let outcomes = query
            .candidates()
            .iter()
            .map(|start| self.search_candidate(&query, *start, cancel, Some(deadline)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.finish(&query, outcomes))
    }
}
