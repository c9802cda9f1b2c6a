//! Agencies and routes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{AgencyId, RouteId, ServiceId, TransportMode, TripId};

/// A transport operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agency {
    pub id: AgencyId,
    pub name: String,
}

impl Agency {
    pub fn new(id: AgencyId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A route: one agency, one mode.
///
/// Trips and services are derived from the timetable when the transport data
/// is built. The calling-point sequence is never stored; it comes from the
/// trips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    /// Short public name, e.g. "Blue" or "86".
    pub short_name: String,
    /// Full display name.
    pub name: String,
    pub agency: AgencyId,
    pub mode: TransportMode,

    #[serde(skip)]
    pub trips: BTreeSet<TripId>,
    #[serde(skip)]
    pub services: BTreeSet<ServiceId>,
}

impl Route {
    pub fn new(
        id: RouteId,
        short_name: impl Into<String>,
        name: impl Into<String>,
        agency: AgencyId,
        mode: TransportMode,
    ) -> Self {
        Self {
            id,
            short_name: short_name.into(),
            name: name.into(),
            agency,
            mode,
            trips: BTreeSet::new(),
            services: BTreeSet::new(),
        }
    }

    /// Name shown to passengers, preferring the short name.
    pub fn display_name(&self) -> &str {
        if self.short_name.is_empty() {
            &self.name
        } else {
            &self.short_name
        }
    }
}
