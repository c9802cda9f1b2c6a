//! Domain types for the journey planner.
//!
//! This module contains the transport data model: stations, routes, trips
//! and calendars, plus the journeys the planner produces. All types enforce
//! their invariants at construction time, so code that receives these types
//! can trust their validity.

mod error;
mod ids;
mod journey;
mod location;
mod mode;
mod route;
mod route_station;
mod service;
mod station;
mod time;
mod trip;

pub use error::DomainError;
pub use ids::{
    AgencyId, InvalidId, PlatformId, PostcodeId, RouteId, RouteStationId, ServiceId,
    StationGroupId, StationId, TripId,
};
pub use journey::{Journey, Stage, StageLocation, VehicleStage, VehicleStageParts, WalkStage};
pub use location::{BoundingBox, GridPosition, LatLong};
pub use mode::TransportMode;
pub use route::{Agency, Route};
pub use route_station::RouteStation;
pub use service::{Calendar, DateRange, DaysOfWeek, Service};
pub use station::{DataSource, Platform, PostcodeLocation, Station, StationGroup};
pub use time::{ServiceTime, TimeError, TimeRange};
pub use trip::{StopCall, Trip};
