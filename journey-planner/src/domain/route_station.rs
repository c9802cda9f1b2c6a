//! A route's presence at a station.

use super::{RouteId, RouteStationId, StationId, TransportMode};

/// One route calling at one station; the routing unit of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteStation {
    pub id: RouteStationId,
    pub mode: TransportMode,
    pub pickup: bool,
    pub dropoff: bool,
}

impl RouteStation {
    pub fn route(&self) -> &RouteId {
        &self.id.route
    }

    pub fn station(&self) -> &StationId {
        &self.id.station
    }

    /// Active if passengers can board or alight here.
    pub fn is_active(&self) -> bool {
        self.pickup || self.dropoff
    }
}
