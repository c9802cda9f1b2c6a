//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They are
//! distinct from data-build and search errors.

use super::ServiceTime;

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// Journey has no stages
    #[error("journey must have at least one stage")]
    EmptyJourney,

    /// Consecutive stages don't share a location
    #[error("stages do not connect: {0} then {1}")]
    StagesNotConnected(String, String),

    /// A stage leaves before the previous one arrives
    #[error("stage departs at {departs} before previous arrival at {arrives}")]
    DepartsBeforeArrival {
        arrives: ServiceTime,
        departs: ServiceTime,
    },

    /// Invalid stage construction
    #[error("invalid stage: {0}")]
    InvalidStage(&'static str),

    /// Coordinate outside WGS84 limits
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(&'static str),
}
