//! Built transport data and its lookups.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::domain::{
    Agency, AgencyId, BoundingBox, DateRange, Platform, PlatformId, PostcodeId, PostcodeLocation,
    Route, RouteId, RouteStation, RouteStationId, Service, ServiceId, Station, StationGroup,
    StationGroupId, StationId, TimeRange, Trip, TripId,
};

use super::Exclusion;

/// An immutable snapshot of the transport network.
///
/// Every id reachable from a stored entity resolves to another stored
/// entity: trips only reference known routes, services and stations, and
/// every route has at least one trip.
#[derive(Debug, Clone)]
pub struct TransportData {
    pub(super) stations: BTreeMap<StationId, Station>,
    pub(super) groups: BTreeMap<StationGroupId, StationGroup>,
    pub(super) platforms: BTreeMap<PlatformId, Platform>,
    pub(super) agencies: BTreeMap<AgencyId, Agency>,
    pub(super) routes: BTreeMap<RouteId, Route>,
    pub(super) services: BTreeMap<ServiceId, Service>,
    pub(super) trips: BTreeMap<TripId, Trip>,
    pub(super) route_stations: BTreeMap<RouteStationId, RouteStation>,
    pub(super) station_route_stations: BTreeMap<StationId, BTreeSet<RouteStationId>>,
    pub(super) postcodes: BTreeMap<PostcodeId, PostcodeLocation>,
    pub(super) bounds: BoundingBox,
    pub(super) date_range: Option<DateRange>,
    pub(super) exclusions: Vec<Exclusion>,
}

impl TransportData {
    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.stations.get(id)
    }

    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn group(&self, id: &StationGroupId) -> Option<&StationGroup> {
        self.groups.get(id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &StationGroup> {
        self.groups.values()
    }

    pub fn platform(&self, id: &PlatformId) -> Option<&Platform> {
        self.platforms.get(id)
    }

    pub fn agency(&self, id: &AgencyId) -> Option<&Agency> {
        self.agencies.get(id)
    }

    pub fn route(&self, id: &RouteId) -> Option<&Route> {
        self.routes.get(id)
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn service(&self, id: &ServiceId) -> Option<&Service> {
        self.services.get(id)
    }

    pub fn trip(&self, id: &TripId) -> Option<&Trip> {
        self.trips.get(id)
    }

    pub fn trips(&self) -> impl Iterator<Item = &Trip> {
        self.trips.values()
    }

    /// Trips running on `route`, in trip id order.
    pub fn trips_for_route<'a>(&'a self, route: &'a Route) -> impl Iterator<Item = &'a Trip> + 'a {
        route.trips.iter().filter_map(|id| self.trips.get(id))
    }

    pub fn route_station(&self, id: &RouteStationId) -> Option<&RouteStation> {
        self.route_stations.get(id)
    }

    pub fn route_stations(&self) -> impl Iterator<Item = &RouteStation> {
        self.route_stations.values()
    }

    /// Every route station at `station`, active or not.
    pub fn route_stations_for<'a>(
        &'a self,
        station: &StationId,
    ) -> impl Iterator<Item = &'a RouteStation> + 'a {
        self.station_route_stations
            .get(station)
            .into_iter()
            .flatten()
            .filter_map(|id| self.route_stations.get(id))
    }

    pub fn postcode(&self, id: &PostcodeId) -> Option<&PostcodeLocation> {
        self.postcodes.get(id)
    }

    pub fn postcodes(&self) -> impl Iterator<Item = &PostcodeLocation> {
        self.postcodes.values()
    }

    /// The box enclosing every station.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Dates covered by at least one service, `None` if there are no services.
    pub fn date_range(&self) -> Option<DateRange> {
        self.date_range
    }

    /// True if `date` is inside the covered date range.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.date_range.is_some_and(|r| r.contains(date))
    }

    /// Entities dropped during the build.
    pub fn exclusions(&self) -> &[Exclusion] {
        &self.exclusions
    }

    /// True if the service runs on `date`. Unknown services never run.
    pub fn service_operates_on(&self, id: &ServiceId, date: NaiveDate) -> bool {
        self.services.get(id).is_some_and(|s| s.operates_on(date))
    }

    /// True if any of the route's services runs on `date`.
    pub fn route_operates_on(&self, id: &RouteId, date: NaiveDate) -> bool {
        self.routes.get(id).is_some_and(|route| {
            route
                .services
                .iter()
                .any(|service| self.service_operates_on(service, date))
        })
    }

    /// True if some trip of `route` running on `date` is travelling during
    /// `window`.
    pub fn route_runs_during(&self, id: &RouteId, date: NaiveDate, window: &TimeRange) -> bool {
        let Some(route) = self.routes.get(id) else {
            return false;
        };
        self.trips_for_route(route).any(|trip| {
            let (Some(departs), Some(arrives)) = (trip.departure_time(), trip.arrival_time()) else {
                return false;
            };
            self.service_operates_on(&trip.service, date)
                && window.overlaps(&TimeRange::new(departs, arrives))
        })
    }
}
