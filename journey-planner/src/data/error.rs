//! Transport data build errors.

use crate::domain::{AgencyId, RouteId, ServiceId, StationId, TransportMode};

/// Fatal errors that stop the transport data from being built at all.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The station table is missing or empty
    #[error("transport data has no stations")]
    NoStations,

    /// Two entities of the same kind share an id
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// Snapshot file could not be read
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot file is not valid JSON
    #[error("failed to parse snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why an entity was left out of the built transport data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExclusionReason {
    #[error("service has no operating days")]
    NoOperatingDays,

    #[error("unknown agency {0}")]
    UnknownAgency(AgencyId),

    #[error("unknown or excluded route {0}")]
    UnknownRoute(RouteId),

    #[error("unknown or excluded service {0}")]
    UnknownService(ServiceId),

    #[error("unknown station {0}")]
    UnknownStation(StationId),

    #[error("fewer than two stop calls")]
    TooFewCalls,

    #[error("leg {from} to {to} arrives before it departs")]
    NegativeLeg { from: StationId, to: StationId },

    #[error("leg {from} to {to} takes {minutes} minutes")]
    ImplausibleLeg {
        from: StationId,
        to: StationId,
        minutes: i64,
    },

    #[error("route has no usable trips")]
    NoTrips,

    #[error("mode {0} is not enabled")]
    ModeNotEnabled(TransportMode),

    #[error("group has no known member stations")]
    EmptyGroup,
}

/// An entity dropped while building, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub kind: &'static str,
    pub id: String,
    pub reason: ExclusionReason,
}
