//! Stations, platforms, composite stations and postcode locations.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{
    AgencyId, GridPosition, LatLong, PlatformId, PostcodeId, RouteId, StationGroupId, StationId,
    TransportMode,
};

/// Which feed a station was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Tram,
    Bus,
    Rail,
    #[default]
    Internal,
}

/// A physical stop.
///
/// The route, agency, mode and platform sets are derived from trips when the
/// transport data is built; values supplied by a loader are replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    #[serde(default)]
    pub area: String,
    pub location: LatLong,
    #[serde(default)]
    pub data_source: DataSource,
    /// Flagged as an interchange by the source feed.
    #[serde(default)]
    pub marked_interchange: bool,

    #[serde(skip)]
    pub grid: GridPosition,
    #[serde(skip)]
    pub platforms: BTreeSet<PlatformId>,
    #[serde(skip)]
    pub pickup_routes: BTreeSet<RouteId>,
    #[serde(skip)]
    pub dropoff_routes: BTreeSet<RouteId>,
    #[serde(skip)]
    pub agencies: BTreeSet<AgencyId>,
    #[serde(skip)]
    pub modes: BTreeSet<TransportMode>,
}

impl Station {
    /// Create a station with no routes yet.
    pub fn new(id: StationId, name: impl Into<String>, location: LatLong) -> Self {
        Self {
            id,
            name: name.into(),
            area: String::new(),
            location,
            data_source: DataSource::Internal,
            marked_interchange: false,
            grid: GridPosition::project(&location),
            platforms: BTreeSet::new(),
            pickup_routes: BTreeSet::new(),
            dropoff_routes: BTreeSet::new(),
            agencies: BTreeSet::new(),
            modes: BTreeSet::new(),
        }
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = area.into();
        self
    }

    pub fn with_source(mut self, source: DataSource) -> Self {
        self.data_source = source;
        self
    }

    /// Mark as an interchange in the source data.
    pub fn marked_interchange(mut self) -> Self {
        self.marked_interchange = true;
        self
    }

    /// True if passengers can board `route` here.
    pub fn has_pickup(&self, route: &RouteId) -> bool {
        self.pickup_routes.contains(route)
    }

    /// True if passengers can alight from `route` here.
    pub fn has_dropoff(&self, route: &RouteId) -> bool {
        self.dropoff_routes.contains(route)
    }

    /// Every route calling here, for pickup or dropoff.
    pub fn all_routes(&self) -> BTreeSet<RouteId> {
        self.pickup_routes
            .union(&self.dropoff_routes)
            .cloned()
            .collect()
    }

    /// True if some vehicle calls here at all.
    pub fn is_served(&self) -> bool {
        !self.pickup_routes.is_empty() || !self.dropoff_routes.is_empty()
    }

    pub(crate) fn clear_derived(&mut self) {
        self.grid = GridPosition::project(&self.location);
        self.platforms.clear();
        self.pickup_routes.clear();
        self.dropoff_routes.clear();
        self.agencies.clear();
        self.modes.clear();
    }
}

/// A platform within a station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub id: PlatformId,
    pub station: StationId,
    pub number: String,
    /// Routes that call at this platform.
    pub routes: BTreeSet<RouteId>,
}

/// A composite station: nearby stops presented as one location.
///
/// Owns no routes of its own; everything except the member list is derived
/// from the members when the transport data is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationGroup {
    pub id: StationGroupId,
    pub name: String,
    #[serde(default)]
    pub area: String,
    pub members: BTreeSet<StationId>,

    /// Mean of the member locations.
    #[serde(skip)]
    pub location: Option<LatLong>,
    #[serde(skip)]
    pub pickup_routes: BTreeSet<RouteId>,
    #[serde(skip)]
    pub dropoff_routes: BTreeSet<RouteId>,
    #[serde(skip)]
    pub modes: BTreeSet<TransportMode>,
}

impl StationGroup {
    pub fn new(
        id: StationGroupId,
        name: impl Into<String>,
        members: impl IntoIterator<Item = StationId>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            area: String::new(),
            members: members.into_iter().collect(),
            location: None,
            pickup_routes: BTreeSet::new(),
            dropoff_routes: BTreeSet::new(),
            modes: BTreeSet::new(),
        }
    }

    pub fn contains(&self, station: &StationId) -> bool {
        self.members.contains(station)
    }
}

/// The centroid of a postcode, usable as a journey endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostcodeLocation {
    pub id: PostcodeId,
    pub location: LatLong,
}
