//! Journey types.
//!
//! A `Journey` is a complete trip from origin to destination: one or more
//! stages, each a vehicle ride or a walk.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use super::{DomainError, LatLong, PlatformId, RouteId, ServiceTime, StationId, TransportMode, TripId};

/// Where a stage starts or ends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StageLocation {
    Station(StationId),
    /// A raw coordinate: the user's position or a postcode centroid.
    Coordinate(LatLong),
}

impl StageLocation {
    pub fn as_station(&self) -> Option<&StationId> {
        match self {
            StageLocation::Station(id) => Some(id),
            StageLocation::Coordinate(_) => None,
        }
    }
}

impl fmt::Display for StageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageLocation::Station(id) => write!(f, "{id}"),
            StageLocation::Coordinate(point) => write!(f, "({:.5}, {:.5})", point.lat(), point.lon()),
        }
    }
}

/// A ride on one vehicle from boarding to alighting.
///
/// # Invariants
///
/// - `arrival >= departure`
/// - `board != alight`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VehicleStage {
    route: RouteId,
    route_name: String,
    mode: TransportMode,
    trip: TripId,
    board: StationId,
    alight: StationId,
    headsign: String,
    platform: Option<PlatformId>,
    departure: ServiceTime,
    arrival: ServiceTime,
    passed_stops: usize,
}

/// Everything needed to describe a vehicle stage.
#[derive(Debug, Clone)]
pub struct VehicleStageParts {
    pub route: RouteId,
    pub route_name: String,
    pub mode: TransportMode,
    pub trip: TripId,
    pub board: StationId,
    pub alight: StationId,
    pub headsign: String,
    pub platform: Option<PlatformId>,
    pub departure: ServiceTime,
    pub arrival: ServiceTime,
    pub passed_stops: usize,
}

impl VehicleStage {
    /// Construct a stage, validating that it travels forward in time and
    /// between two different stations.
    pub fn new(parts: VehicleStageParts) -> Result<Self, DomainError> {
        if parts.arrival < parts.departure {
            return Err(DomainError::InvalidStage("arrival must not be before departure"));
        }
        if parts.board == parts.alight {
            return Err(DomainError::InvalidStage("must alight at a different station"));
        }
        if parts.mode == TransportMode::Walk {
            return Err(DomainError::InvalidStage("vehicle stage cannot be a walk"));
        }
        Ok(Self {
            route: parts.route,
            route_name: parts.route_name,
            mode: parts.mode,
            trip: parts.trip,
            board: parts.board,
            alight: parts.alight,
            headsign: parts.headsign,
            platform: parts.platform,
            departure: parts.departure,
            arrival: parts.arrival,
            passed_stops: parts.passed_stops,
        })
    }

    pub fn route(&self) -> &RouteId {
        &self.route
    }

    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    pub fn trip(&self) -> &TripId {
        &self.trip
    }

    pub fn board_station(&self) -> &StationId {
        &self.board
    }

    pub fn alight_station(&self) -> &StationId {
        &self.alight
    }

    pub fn headsign(&self) -> &str {
        &self.headsign
    }

    pub fn platform(&self) -> Option<&PlatformId> {
        self.platform.as_ref()
    }

    pub fn departure_time(&self) -> ServiceTime {
        self.departure
    }

    pub fn arrival_time(&self) -> ServiceTime {
        self.arrival
    }

    /// Calling points passed between boarding and alighting.
    pub fn passed_stops(&self) -> usize {
        self.passed_stops
    }

    pub fn duration(&self) -> Duration {
        self.arrival.signed_duration_since(self.departure)
    }
}

/// A walk with a fixed cost.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalkStage {
    pub from: StageLocation,
    pub to: StageLocation,
    pub departure: ServiceTime,
    pub cost: Duration,
}

impl WalkStage {
    pub fn new(from: StageLocation, to: StageLocation, departure: ServiceTime, cost: Duration) -> Self {
        Self {
            from,
            to,
            departure,
            cost,
        }
    }

    pub fn arrival_time(&self) -> ServiceTime {
        self.departure.saturating_add(self.cost)
    }

    /// The same walk, leaving so as to arrive exactly at `arrival`.
    pub fn arriving_at(&self, arrival: ServiceTime) -> Self {
        Self {
            departure: arrival.saturating_sub(self.cost),
            ..self.clone()
        }
    }
}

/// A stage of a journey: a vehicle ride or a walk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Stage {
    Vehicle(VehicleStage),
    Walk(WalkStage),
}

impl Stage {
    /// Where this stage starts.
    pub fn origin(&self) -> StageLocation {
        match self {
            Stage::Vehicle(v) => StageLocation::Station(v.board.clone()),
            Stage::Walk(w) => w.from.clone(),
        }
    }

    /// Where this stage ends.
    pub fn destination(&self) -> StageLocation {
        match self {
            Stage::Vehicle(v) => StageLocation::Station(v.alight.clone()),
            Stage::Walk(w) => w.to.clone(),
        }
    }

    pub fn departure_time(&self) -> ServiceTime {
        match self {
            Stage::Vehicle(v) => v.departure,
            Stage::Walk(w) => w.departure,
        }
    }

    pub fn arrival_time(&self) -> ServiceTime {
        match self {
            Stage::Vehicle(v) => v.arrival,
            Stage::Walk(w) => w.arrival_time(),
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Stage::Vehicle(v) => v.duration(),
            Stage::Walk(w) => w.cost,
        }
    }

    pub fn mode(&self) -> TransportMode {
        match self {
            Stage::Vehicle(v) => v.mode,
            Stage::Walk(_) => TransportMode::Walk,
        }
    }

    pub fn is_vehicle(&self) -> bool {
        matches!(self, Stage::Vehicle(_))
    }

    pub fn is_walk(&self) -> bool {
        matches!(self, Stage::Walk(_))
    }

    pub fn as_vehicle(&self) -> Option<&VehicleStage> {
        match self {
            Stage::Vehicle(v) => Some(v),
            Stage::Walk(_) => None,
        }
    }

    pub fn as_walk(&self) -> Option<&WalkStage> {
        match self {
            Stage::Vehicle(_) => None,
            Stage::Walk(w) => Some(w),
        }
    }

    /// Route display name; "Walk" for walks.
    pub fn route_name(&self) -> &str {
        match self {
            Stage::Vehicle(v) => &v.route_name,
            Stage::Walk(_) => "Walk",
        }
    }

    /// Headsign; empty for walks.
    pub fn headsign(&self) -> &str {
        match self {
            Stage::Vehicle(v) => &v.headsign,
            Stage::Walk(_) => "",
        }
    }

    /// Platform, vehicle stages only.
    pub fn platform(&self) -> Option<&PlatformId> {
        self.as_vehicle().and_then(|v| v.platform())
    }

    /// Calling points passed without boarding; zero for walks.
    pub fn passed_stops(&self) -> usize {
        self.as_vehicle().map_or(0, |v| v.passed_stops)
    }
}

/// A complete journey from origin to destination.
///
/// # Invariants
///
/// - At least one stage
/// - Consecutive stages connect (destination of one = origin of next)
/// - No stage departs before the previous one arrives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Journey {
    stages: Vec<Stage>,
}

impl Journey {
    /// Constructs a journey from stages, validating the invariants.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the list is empty, stages don't connect, or a stage
    /// departs before its predecessor arrives.
    pub fn new(stages: Vec<Stage>) -> Result<Self, DomainError> {
        if stages.is_empty() {
            return Err(DomainError::EmptyJourney);
        }

        for window in stages.windows(2) {
            let prev_dest = window[0].destination();
            let next_origin = window[1].origin();
            if prev_dest != next_origin {
                return Err(DomainError::StagesNotConnected(
                    prev_dest.to_string(),
                    next_origin.to_string(),
                ));
            }
            let arrives = window[0].arrival_time();
            let departs = window[1].departure_time();
            if departs < arrives {
                return Err(DomainError::DepartsBeforeArrival { arrives, departs });
            }
        }

        Ok(Journey { stages })
    }

    /// Returns all stages in order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Vehicle stages in order.
    pub fn vehicle_stages(&self) -> impl Iterator<Item = &VehicleStage> {
        self.stages.iter().filter_map(|s| s.as_vehicle())
    }

    /// Walk stages in order.
    pub fn walks(&self) -> impl Iterator<Item = &WalkStage> {
        self.stages.iter().filter_map(|s| s.as_walk())
    }

    /// Number of changes: consecutive vehicle stages on different routes.
    ///
    /// Moving to a later trip on the same route is not a change.
    pub fn change_count(&self) -> usize {
        let routes: Vec<&RouteId> = self.vehicle_stages().map(|v| v.route()).collect();
        routes.windows(2).filter(|pair| pair[0] != pair[1]).count()
    }

    /// True if no change is needed.
    pub fn is_direct(&self) -> bool {
        self.change_count() == 0
    }

    pub fn origin(&self) -> StageLocation {
        self.stages[0].origin()
    }

    pub fn destination(&self) -> StageLocation {
        self.stages[self.stages.len() - 1].destination()
    }

    pub fn departure_time(&self) -> ServiceTime {
        self.stages[0].departure_time()
    }

    pub fn arrival_time(&self) -> ServiceTime {
        self.stages[self.stages.len() - 1].arrival_time()
    }

    pub fn total_duration(&self) -> Duration {
        self.arrival_time().signed_duration_since(self.departure_time())
    }

    pub fn total_walk_duration(&self) -> Duration {
        self.walks().fold(Duration::zero(), |acc, w| acc + w.cost)
    }

    /// Departure as a timestamp, given the service day the journey runs on.
    pub fn departure_at(&self, service_day: NaiveDate) -> NaiveDateTime {
        self.departure_time().on_date(service_day)
    }

    /// Arrival as a timestamp, given the service day the journey runs on.
    pub fn arrival_at(&self, service_day: NaiveDate) -> NaiveDateTime {
        self.arrival_time().on_date(service_day)
    }

    /// Stations passed through at stage boundaries, in order, without repeats
    /// of the same boundary.
    pub fn call_points(&self) -> Vec<StationId> {
        let mut points: Vec<StationId> = Vec::new();
        for stage in &self.stages {
            for location in [stage.origin(), stage.destination()] {
                if let StageLocation::Station(id) = location {
                    if points.last() != Some(&id) {
                        points.push(id);
                    }
                }
            }
        }
        points
    }
}
