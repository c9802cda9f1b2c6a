//! Time-expanded journey search for one candidate start time.
//!
//! Labels are popped in order of arrival time, then changes. A label sits at
//! a station node; from there it may board a route (riding the first
//! operating trip to every later stop that sets down) or walk to a
//! neighbouring station.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{Duration, NaiveDate};
use tracing::{debug, trace};

use crate::domain::{
    Journey, RouteId, RouteStationId, ServiceTime, Stage, StageLocation, StationId, TransportMode,
    TripId, VehicleStage, VehicleStageParts, WalkStage,
};
use crate::graph::{EdgeKind, Node, NodeIndex};

use super::calculator::{Endpoint, PreparedQuery, RouteCalculator};

/// Error from journey search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Invalid search request
    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    /// Origin or destination not in the loaded data
    #[error("unknown location: {0}")]
    UnknownLocation(String),

    /// No timetable loaded for the requested date
    #[error("no timetable for {0}")]
    DateOutOfRange(NaiveDate),

    /// No network has been published yet
    #[error("no network loaded")]
    NotReady,

    /// Search was cancelled by the caller
    #[error("search cancelled")]
    Aborted,

    /// Search timed out
    #[error("search timed out")]
    Timeout,

    /// A search task failed to complete
    #[error("search task failed: {0}")]
    Task(String),
}

/// Result of journey search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    /// Found journeys, ranked best-first.
    pub journeys: Vec<Journey>,

    /// Labels popped across all candidate searches.
    pub states_explored: usize,

    pub candidates_searched: usize,
}

impl SearchResult {
    /// Create an empty result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True if nothing was found.
    pub fn is_exhausted(&self) -> bool {
        self.journeys.is_empty()
    }
}

/// Shared flag asking running searches to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Journeys found from one candidate start time.
#[derive(Debug, Clone, Default)]
pub struct CandidateOutcome {
    pub start: Option<ServiceTime>,
    pub journeys: Vec<Journey>,
    pub states_explored: usize,
}

/// How often the wall clock is checked, in popped labels.
const CLOCK_CHECK_INTERVAL: usize = 256;

/// A partial journey ending at a station.
#[derive(Debug, Clone)]
struct Label {
    station: StationId,
    node: NodeIndex,
    time: ServiceTime,
    changes: u32,
    first_route: Option<RouteId>,
    last_route: Option<RouteId>,
    /// Never boarded again; a later trip on the same route may be.
    last_trip: Option<TripId>,
    /// Where the last vehicle was left, for the interchange rule after a walk.
    last_alight: Option<StationId>,
    walked_last: bool,
    /// When the journey starts, fixed once a vehicle is boarded.
    started: Option<ServiceTime>,
    /// Walking done before the first vehicle.
    lead_walk: Duration,
    stages: Vec<Stage>,
    visited: Vec<StationId>,
}

impl Label {
    fn has_vehicle(&self) -> bool {
        self.started.is_some()
    }
}

/// Dominance key: a later label with the same key and no fewer changes
/// cannot do better.
type LabelKey = (StationId, Option<RouteId>, Option<RouteId>, bool);

pub(super) struct CandidateSearch<'q, 'a> {
    calc: &'q RouteCalculator<'a>,
    query: &'q PreparedQuery,
    start: ServiceTime,
    cancel: &'q CancelFlag,
    deadline: Option<Instant>,

    labels: Vec<Option<Label>>,
    heap: BinaryHeap<Reverse<(ServiceTime, u32, usize)>>,
    best: BTreeMap<LabelKey, u32>,
    /// Earliest arrival found for each first route.
    found: BTreeMap<RouteId, ServiceTime>,
    journeys: Vec<Journey>,
}

impl<'q, 'a> CandidateSearch<'q, 'a> {
    pub(super) fn new(
        calc: &'q RouteCalculator<'a>,
        query: &'q PreparedQuery,
        start: ServiceTime,
        cancel: &'q CancelFlag,
        deadline: Option<Instant>,
    ) -> Self {
        Self {
            calc,
            query,
            start,
            cancel,
            deadline,
            labels: Vec::new(),
            heap: BinaryHeap::new(),
            best: BTreeMap::new(),
            found: BTreeMap::new(),
            journeys: Vec::new(),
        }
    }

    fn date(&self) -> NaiveDate {
        self.query.request.date
    }

    fn is_closed(&self, station: &StationId) -> bool {
        self.calc.closures.is_closed(station, self.date())
    }

    fn push(&mut self, label: Label) {
        let seq = self.labels.len();
        self.heap.push(Reverse((label.time, label.changes, seq)));
        self.labels.push(Some(label));
    }

    /// Run to completion, returning the journeys found in discovery order.
    pub(super) fn run(mut self) -> Result<CandidateOutcome, SearchError> {
        self.seed();

        let max_states = self.calc.config.search.max_states;
        let max_results = self.calc.config.search.max_results;
        let mut explored = 0;

        while let Some(Reverse((_, _, seq))) = self.heap.pop() {
            if self.journeys.len() >= max_results {
                break;
            }
            if self.cancel.is_cancelled() {
                return Err(SearchError::Aborted);
            }
            if explored % CLOCK_CHECK_INTERVAL == 0
                && self.deadline.is_some_and(|d| Instant::now() >= d)
            {
                return Err(SearchError::Timeout);
            }
            if explored >= max_states {
                debug!(start = %self.start, explored, "State limit reached");
                break;
            }
            explored += 1;

            let Some(label) = self.labels[seq].take() else {
                continue;
            };
            if self.is_dominated(&label) || self.is_beaten(&label) {
                continue;
            }
            trace!(station = %label.station, time = %label.time, changes = label.changes, "Expanding");

            if self.arrive(&label) {
                continue;
            }
            self.board(&label);
            self.walk(&label);
        }

        debug!(
            start = %self.start,
            journeys = self.journeys.len(),
            explored,
            "Candidate search finished"
        );
        Ok(CandidateOutcome {
            start: Some(self.start),
            journeys: self.journeys,
            states_explored: explored,
        })
    }

    fn seed(&mut self) {
        let start = self.start;
        let query = self.query;
        match &query.origin {
            Endpoint::Stations(stations) => {
                for station in stations {
                    if self.is_closed(station) {
                        continue;
                    }
                    let Some(node) = self.calc.graph.station_node(station) else {
                        continue;
                    };
                    self.push(Label {
                        station: station.clone(),
                        node,
                        time: start,
                        changes: 0,
                        first_route: None,
                        last_route: None,
                        last_trip: None,
                        last_alight: None,
                        walked_last: false,
                        started: None,
                        lead_walk: Duration::zero(),
                        stages: Vec::new(),
                        visited: vec![station.clone()],
                    });
                }
            }
            Endpoint::Coordinate { point, walks } => {
                for (station, cost) in walks {
                    if self.is_closed(station) {
                        continue;
                    }
                    let (Some(node), Some(time)) =
                        (self.calc.graph.station_node(station), start.checked_add(*cost))
                    else {
                        continue;
                    };
                    let walk = WalkStage::new(
                        StageLocation::Coordinate(*point),
                        StageLocation::Station(station.clone()),
                        start,
                        *cost,
                    );
                    self.push(Label {
                        station: station.clone(),
                        node,
                        time,
                        changes: 0,
                        first_route: None,
                        last_route: None,
                        last_trip: None,
                        last_alight: None,
                        walked_last: true,
                        started: None,
                        lead_walk: *cost,
                        stages: vec![Stage::Walk(walk)],
                        visited: vec![station.clone()],
                    });
                }
            }
        }
    }

    fn is_dominated(&mut self, label: &Label) -> bool {
        let key = (
            label.station.clone(),
            label.first_route.clone(),
            label.last_route.clone(),
            label.walked_last,
        );
        match self.best.get(&key) {
            Some(changes) if *changes <= label.changes => true,
            _ => {
                self.best.insert(key, label.changes);
                false
            }
        }
    }

    /// A journey starting on the same route already arrives no later.
    fn is_beaten(&self, label: &Label) -> bool {
        label
            .first_route
            .as_ref()
            .and_then(|route| self.found.get(route))
            .is_some_and(|arrival| *arrival <= label.time)
    }

    fn within_limits(&self, started: ServiceTime, arrival: ServiceTime) -> bool {
        if arrival.signed_duration_since(started) > self.query.request.max_duration {
            return false;
        }
        self.query.latest_arrival.is_none_or(|latest| arrival <= latest)
    }

    /// Record journeys ending at this label. True if the label is at a
    /// destination station and should not be expanded.
    fn arrive(&mut self, label: &Label) -> bool {
        let Some(started) = label.started else {
            return false;
        };
        let query = self.query;
        match &query.destination {
            Endpoint::Stations(stations) => {
                if !stations.contains(&label.station) {
                    return false;
                }
                if self.within_limits(started, label.time) {
                    self.record(label, label.stages.clone(), label.time);
                }
                true
            }
            Endpoint::Coordinate { point, walks } => {
                if label.walked_last {
                    return false;
                }
                let Some(cost) = walks.get(&label.station) else {
                    return false;
                };
                let Some(arrival) = label.time.checked_add(*cost) else {
                    return false;
                };
                if self.within_limits(started, arrival) {
                    let walk = WalkStage::new(
                        StageLocation::Station(label.station.clone()),
                        StageLocation::Coordinate(*point),
                        label.time,
                        *cost,
                    );
                    let mut stages = label.stages.clone();
                    stages.push(Stage::Walk(walk));
                    self.record(label, stages, arrival);
                }
                false
            }
        }
    }

    fn record(&mut self, label: &Label, stages: Vec<Stage>, arrival: ServiceTime) {
        match Journey::new(retime_lead_walk(stages)) {
            Ok(journey) => {
                if let Some(route) = &label.first_route {
                    let best = self.found.entry(route.clone()).or_insert(arrival);
                    *best = (*best).min(arrival);
                }
                debug!(
                    departs = %journey.departure_time(),
                    arrives = %journey.arrival_time(),
                    changes = journey.change_count(),
                    "Found journey"
                );
                self.journeys.push(journey);
            }
            Err(e) => debug!(error = %e, "Discarded inconsistent journey"),
        }
    }

    /// Changing is allowed where the last vehicle was left, or where the
    /// next is boarded, if either is an interchange.
    fn can_change_at(&self, label: &Label) -> bool {
        let interchanges = self.calc.interchanges;
        interchanges.is_interchange(&label.station)
            || label
                .last_alight
                .as_ref()
                .is_some_and(|s| interchanges.is_interchange(s))
    }

    fn board(&mut self, label: &Label) {
        let graph = self.calc.graph;
        let config = self.calc.config;
        let search = &config.search;
        let query = self.query;
        let max_changes = query.max_changes;

        for (_, edge) in graph.outgoing(label.node) {
            if !matches!(edge.kind, EdgeKind::Board { .. }) {
                continue;
            }
            let Node::RouteStation { id, mode } = graph.node(edge.to) else {
                continue;
            };
            if !query.request.modes.contains(mode) {
                continue;
            }
            let route = &id.route;
            let same_route = label.last_route.as_ref() == Some(route);
            let is_change = label.last_route.is_some() && !same_route;
            let changes = label.changes + u32::from(is_change);
            if changes > max_changes || (is_change && !self.can_change_at(label)) {
                continue;
            }
            let Some(hops) = query.hops.min_hops(route) else {
                continue;
            };
            if changes as usize + hops > max_changes as usize {
                continue;
            }

            let earliest = if is_change {
                label.time.saturating_add(search.min_change())
            } else {
                label.time
            };
            let latest = if label.has_vehicle() {
                None
            } else {
                Some(label.time.saturating_add(search.max_initial_wait()))
            };
            self.ride(label, edge.to, id, *mode, changes, earliest, latest);
        }
    }

    /// Board the first suitable trip at `node` and add a label for every
    /// later stop it sets down at.
    #[allow(clippy::too_many_arguments)]
    fn ride(
        &mut self,
        label: &Label,
        node: NodeIndex,
        id: &RouteStationId,
        mode: TransportMode,
        changes: u32,
        earliest: ServiceTime,
        latest: Option<ServiceTime>,
    ) {
        let calc = self.calc;
        let graph = calc.graph;
        let date = self.date();

        let Some((first_edge, first)) = graph
            .departures_from(node, earliest)
            .take_while(|(_, ride)| latest.is_none_or(|l| ride.departure <= l))
            .find(|(_, ride)| {
                ride.pickup
                    && label.last_trip.as_ref() != Some(&ride.trip)
                    && calc.data.service_operates_on(&ride.service, date)
            })
        else {
            return;
        };

        let route_name = calc
            .data
            .route(&id.route)
            .map(|r| r.display_name().to_string())
            .unwrap_or_else(|| id.route.to_string());
        let headsign = calc
            .data
            .trip(&first.trip)
            .map(|t| t.headsign.clone())
            .unwrap_or_default();
        let started = label
            .started
            .unwrap_or_else(|| first.departure.saturating_sub(label.lead_walk));

        let mut next = Some(first_edge);
        let mut legs = 0;
        while let Some(index) = next {
            let Some(ride) = graph.ride(index) else {
                break;
            };
            let station = graph.node(graph.edge(index).to).station().clone();
            if self.is_closed(&station) || !self.within_limits(started, ride.arrival) {
                break;
            }

            if ride.dropoff && !label.visited.contains(&station) {
                let stage = VehicleStage::new(VehicleStageParts {
                    route: id.route.clone(),
                    route_name: route_name.clone(),
                    mode,
                    trip: first.trip.clone(),
                    board: label.station.clone(),
                    alight: station.clone(),
                    headsign: headsign.clone(),
                    platform: first.platform.clone(),
                    departure: first.departure,
                    arrival: ride.arrival,
                    passed_stops: legs,
                });
                match (stage, graph.station_node(&station)) {
                    (Ok(stage), Some(station_node)) => {
                        let mut stages = label.stages.clone();
                        stages.push(Stage::Vehicle(stage));
                        let mut visited = label.visited.clone();
                        visited.push(station.clone());
                        self.push(Label {
                            station: station.clone(),
                            node: station_node,
                            time: ride.arrival,
                            changes,
                            first_route: label.first_route.clone().or_else(|| Some(id.route.clone())),
                            last_route: Some(id.route.clone()),
                            last_trip: Some(first.trip.clone()),
                            last_alight: Some(station),
                            walked_last: false,
                            started: Some(started),
                            lead_walk: label.lead_walk,
                            stages,
                            visited,
                        });
                    }
                    (Err(e), _) => debug!(error = %e, trip = %first.trip, "Skipped invalid stage"),
                    (_, None) => {}
                }
            }

            legs += 1;
            next = ride.next;
        }
    }

    fn walk(&mut self, label: &Label) {
        if label.walked_last {
            return;
        }
        let graph = self.calc.graph;
        for (_, edge) in graph.outgoing(label.node) {
            let EdgeKind::Walk { cost } = edge.kind else {
                continue;
            };
            let station = graph.node(edge.to).station();
            if label.visited.contains(station) || self.is_closed(station) {
                continue;
            }
            let Some(arrival) = label.time.checked_add(cost) else {
                continue;
            };
            if label
                .started
                .is_some_and(|started| !self.within_limits(started, arrival))
            {
                continue;
            }

            let walk = WalkStage::new(
                StageLocation::Station(label.station.clone()),
                StageLocation::Station(station.clone()),
                label.time,
                cost,
            );
            let mut stages = label.stages.clone();
            stages.push(Stage::Walk(walk));
            let mut visited = label.visited.clone();
            visited.push(station.clone());
            let lead_walk = if label.has_vehicle() {
                label.lead_walk
            } else {
                label.lead_walk + cost
            };

            self.push(Label {
                station: station.clone(),
                node: edge.to,
                time: arrival,
                changes: label.changes,
                first_route: label.first_route.clone(),
                last_route: label.last_route.clone(),
                last_trip: label.last_trip.clone(),
                last_alight: label.last_alight.clone(),
                walked_last: true,
                started: label.started,
                lead_walk,
                stages,
                visited,
            });
        }
    }
}

/// Move a walk before the first vehicle so it ends as the vehicle leaves.
fn retime_lead_walk(mut stages: Vec<Stage>) -> Vec<Stage> {
    if let [Stage::Walk(walk), Stage::Vehicle(vehicle), ..] = stages.as_slice() {
        let retimed = walk.arriving_at(vehicle.departure_time());
        stages[0] = Stage::Walk(retimed);
    }
    stages
}
