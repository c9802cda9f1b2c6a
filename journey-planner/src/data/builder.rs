//! Building and validating transport data.
//!
//! Loaders hand over raw entities; the builder checks references, drops
//! inconsistent trips and routes (recording an [`Exclusion`] for each), and
//! derives the station, platform, group and route-station attributes that
//! depend on the timetable.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{
    Agency, BoundingBox, LatLong, Platform, PlatformId, PostcodeLocation, Route, RouteStation,
    RouteStationId, Service, Station, StationGroup, StationId, TransportMode, Trip,
};

use super::{BuildError, Exclusion, ExclusionReason, TransportData};

/// Legs longer than this are data defects unless the mode is marine.
const MAX_LEG_HOURS: i64 = 12;

/// The serialized form of a transport data snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportDataSnapshot {
    pub stations: Vec<Station>,
    #[serde(default)]
    pub groups: Vec<StationGroup>,
    pub agencies: Vec<Agency>,
    pub routes: Vec<Route>,
    pub services: Vec<Service>,
    pub trips: Vec<Trip>,
    #[serde(default)]
    pub postcodes: Vec<PostcodeLocation>,
}

impl TransportDataSnapshot {
    pub fn from_json_str(json: &str) -> Result<Self, BuildError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, BuildError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn into_builder(self) -> TransportDataBuilder {
        TransportDataBuilder {
            stations: self.stations,
            groups: self.groups,
            agencies: self.agencies,
            routes: self.routes,
            services: self.services,
            trips: self.trips,
            postcodes: self.postcodes,
            modes: None,
        }
    }
}

/// Collects raw entities and builds a validated [`TransportData`].
#[derive(Debug, Default)]
pub struct TransportDataBuilder {
    stations: Vec<Station>,
    groups: Vec<StationGroup>,
    agencies: Vec<Agency>,
    routes: Vec<Route>,
    services: Vec<Service>,
    trips: Vec<Trip>,
    postcodes: Vec<PostcodeLocation>,
    modes: Option<BTreeSet<TransportMode>>,
}

impl TransportDataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn station(mut self, station: Station) -> Self {
        self.stations.push(station);
        self
    }

    pub fn group(mut self, group: StationGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn agency(mut self, agency: Agency) -> Self {
        self.agencies.push(agency);
        self
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    pub fn trip(mut self, trip: Trip) -> Self {
        self.trips.push(trip);
        self
    }

    pub fn postcode(mut self, postcode: PostcodeLocation) -> Self {
        self.postcodes.push(postcode);
        self
    }

    /// The raw entities collected so far, in serializable form.
    pub fn into_snapshot(self) -> TransportDataSnapshot {
        TransportDataSnapshot {
            stations: self.stations,
            groups: self.groups,
            agencies: self.agencies,
            routes: self.routes,
            services: self.services,
            trips: self.trips,
            postcodes: self.postcodes,
        }
    }

    /// Keep only routes of these modes; others are excluded.
    pub fn only_modes(mut self, modes: impl IntoIterator<Item = TransportMode>) -> Self {
        self.modes = Some(modes.into_iter().collect());
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// Fails only on structural problems: no stations, or duplicate ids.
    /// Inconsistent services, routes, trips and groups are excluded and
    /// listed in [`TransportData::exclusions`].
    pub fn build(self) -> Result<TransportData, BuildError> {
        if self.stations.is_empty() {
            return Err(BuildError::NoStations);
        }

        let mut exclusions = Exclusions::default();

        let mut stations = index_unique("station", self.stations, |s| s.id.clone())?;
        for station in stations.values_mut() {
            station.clear_derived();
        }
        let agencies = index_unique("agency", self.agencies, |a| a.id.clone())?;
        let mut services = index_unique("service", self.services, |s| s.id.clone())?;
        let mut routes = index_unique("route", self.routes, |r| r.id.clone())?;
        let trips = index_unique("trip", self.trips, |t| t.id.clone())?;
        let groups = index_unique("group", self.groups, |g| g.id.clone())?;
        let postcodes = index_unique("postcode", self.postcodes, |p| p.id.clone())?;

        services.retain(|id, service| {
            let keep = service.calendar.has_any_day();
            if !keep {
                exclusions.push("service", id, ExclusionReason::NoOperatingDays);
            }
            keep
        });

        routes.retain(|id, route| {
            route.trips.clear();
            route.services.clear();
            if let Some(modes) = &self.modes {
                if !modes.contains(&route.mode) {
                    exclusions.push("route", id, ExclusionReason::ModeNotEnabled(route.mode));
                    return false;
                }
            }
            if !agencies.contains_key(&route.agency) {
                exclusions.push("route", id, ExclusionReason::UnknownAgency(route.agency.clone()));
                return false;
            }
            true
        });

        let mut kept_trips = BTreeMap::new();
        for (id, mut trip) in trips {
            trip.calls.sort_by_key(|c| c.sequence);
            let Some(route) = routes.get(&trip.route) else {
                exclusions.push("trip", &id, ExclusionReason::UnknownRoute(trip.route.clone()));
                continue;
            };
            if !services.contains_key(&trip.service) {
                exclusions.push("trip", &id, ExclusionReason::UnknownService(trip.service.clone()));
                continue;
            }
            if let Err(reason) = check_calls(&trip, route.mode, &stations) {
                exclusions.push("trip", &id, reason);
                continue;
            }
            kept_trips.insert(id, trip);
        }

        let mut platforms: BTreeMap<PlatformId, Platform> = BTreeMap::new();
        let mut route_stations: BTreeMap<RouteStationId, RouteStation> = BTreeMap::new();

        for trip in kept_trips.values() {
            let Some(route) = routes.get_mut(&trip.route) else {
                continue;
            };
            route.trips.insert(trip.id.clone());
            route.services.insert(trip.service.clone());

            let last = trip.calls.len() - 1;
            for (index, call) in trip.calls.iter().enumerate() {
                let pickup = call.pickup && index < last;
                let dropoff = call.dropoff && index > 0;

                let Some(station) = stations.get_mut(&call.station) else {
                    continue;
                };
                station.agencies.insert(route.agency.clone());
                station.modes.insert(route.mode);
                if pickup {
                    station.pickup_routes.insert(route.id.clone());
                }
                if dropoff {
                    station.dropoff_routes.insert(route.id.clone());
                }

                if let Some(number) = &call.platform {
                    if let Ok(platform_id) = PlatformId::for_station(&station.id, number) {
                        station.platforms.insert(platform_id.clone());
                        platforms
                            .entry(platform_id.clone())
                            .or_insert_with(|| Platform {
                                id: platform_id,
                                station: station.id.clone(),
                                number: number.clone(),
                                routes: BTreeSet::new(),
                            })
                            .routes
                            .insert(route.id.clone());
                    }
                }

                let rs_id = RouteStationId::new(route.id.clone(), call.station.clone());
                let entry = route_stations
                    .entry(rs_id.clone())
                    .or_insert_with(|| RouteStation {
                        id: rs_id,
                        mode: route.mode,
                        pickup: false,
                        dropoff: false,
                    });
                entry.pickup |= pickup;
                entry.dropoff |= dropoff;
            }
        }

        routes.retain(|id, route| {
            let keep = !route.trips.is_empty();
            if !keep {
                exclusions.push("route", id, ExclusionReason::NoTrips);
            }
            keep
        });

        let mut station_route_stations: BTreeMap<_, BTreeSet<RouteStationId>> = BTreeMap::new();
        for id in route_stations.keys() {
            station_route_stations
                .entry(id.station.clone())
                .or_default()
                .insert(id.clone());
        }

        let mut kept_groups = BTreeMap::new();
        for (id, mut group) in groups {
            group.members.retain(|m| stations.contains_key(m));
            if group.members.is_empty() {
                exclusions.push("group", &id, ExclusionReason::EmptyGroup);
                continue;
            }
            derive_group(&mut group, &stations);
            kept_groups.insert(id, group);
        }

        let bounds = BoundingBox::enclosing(stations.values().map(|s| &s.location))
            .ok_or(BuildError::NoStations)?;

        let date_range = services
            .values()
            .map(|s| s.calendar.span())
            .reduce(|a, b| a.union(&b));

        let data = TransportData {
            stations,
            groups: kept_groups,
            platforms,
            agencies,
            routes,
            services,
            trips: kept_trips,
            route_stations,
            station_route_stations,
            postcodes,
            bounds,
            date_range,
            exclusions: exclusions.0,
        };

        info!(
            stations = data.stations.len(),
            routes = data.routes.len(),
            trips = data.trips.len(),
            route_stations = data.route_stations.len(),
            excluded = data.exclusions.len(),
            "Transport data built"
        );

        Ok(data)
    }
}

#[derive(Default)]
struct Exclusions(Vec<Exclusion>);

impl Exclusions {
    fn push(&mut self, kind: &'static str, id: &impl std::fmt::Display, reason: ExclusionReason) {
        match reason {
            ExclusionReason::ModeNotEnabled(_) => {
                debug!(kind, id = %id, reason = %reason, "Excluded from transport data")
            }
            _ => warn!(kind, id = %id, reason = %reason, "Excluded from transport data"),
        }
        self.0.push(Exclusion {
            kind,
            id: id.to_string(),
            reason,
        });
    }
}

fn index_unique<K: Ord + std::fmt::Display, V>(
    kind: &'static str,
    items: Vec<V>,
    key: impl Fn(&V) -> K,
) -> Result<BTreeMap<K, V>, BuildError> {
    let mut map = BTreeMap::new();
    for item in items {
        let k = key(&item);
        if map.contains_key(&k) {
            return Err(BuildError::DuplicateId {
                kind,
                id: k.to_string(),
            });
        }
        map.insert(k, item);
    }
    Ok(map)
}

fn check_calls(
    trip: &Trip,
    mode: TransportMode,
    stations: &BTreeMap<StationId, Station>,
) -> Result<(), ExclusionReason> {
    if trip.calls.len() < 2 {
        return Err(ExclusionReason::TooFewCalls);
    }
    if let Some(call) = trip.calls.iter().find(|c| !stations.contains_key(&c.station)) {
        return Err(ExclusionReason::UnknownStation(call.station.clone()));
    }
    for (from, to) in trip.legs() {
        let Some(cost) = from.cost_to(to) else {
            return Err(ExclusionReason::NegativeLeg {
                from: from.station.clone(),
                to: to.station.clone(),
            });
        };
        if !mode.is_marine() && cost > Duration::hours(MAX_LEG_HOURS) {
            return Err(ExclusionReason::ImplausibleLeg {
                from: from.station.clone(),
                to: to.station.clone(),
                minutes: cost.num_minutes(),
            });
        }
    }
    Ok(())
}

fn derive_group(group: &mut StationGroup, stations: &BTreeMap<StationId, Station>) {
    let members: Vec<&Station> = group
        .members
        .iter()
        .filter_map(|id| stations.get(id))
        .collect();
    group.location = LatLong::centroid(members.iter().map(|s| &s.location));
    group.pickup_routes = members.iter().flat_map(|s| s.pickup_routes.iter().cloned()).collect();
    group.dropoff_routes = members.iter().flat_map(|s| s.dropoff_routes.iter().cloned()).collect();
    group.modes = members.iter().flat_map(|s| s.modes.iter().copied()).collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Calendar, DaysOfWeek, ServiceId, StationGroupId, StopCall, TripId};
    use crate::test_support::{builder, ll, query_date, rid, service_range, sid, station, t, trip};

    #[test]
    fn derives_station_routes() {
        let data = builder().build().unwrap();
        let first = data.station(&sid("First")).unwrap();
        assert!(first.has_pickup(&rid("A")));
        assert!(!first.has_dropoff(&rid("A")));

        let interchange = data.station(&sid("Interchange")).unwrap();
        assert!(interchange.has_pickup(&rid("A")));
        assert!(interchange.has_dropoff(&rid("A")));
        assert!(interchange.has_pickup(&rid("B")));
        assert!(!interchange.has_dropoff(&rid("B")));

        let beyond = data.station(&sid("Beyond")).unwrap();
        assert!(beyond.pickup_routes.is_empty());
        assert!(beyond.has_dropoff(&rid("B")));
        assert!(beyond.modes.contains(&TransportMode::Tram));

        assert_eq!(data.route_stations().count(), 7);
        assert_eq!(data.route_stations_for(&sid("Last")).count(), 2);
        assert!(data.exclusions().is_empty());
        assert_eq!(data.date_range(), Some(service_range()));
        assert!(data.contains_date(query_date()));
    }

    #[test]
    fn route_operating_days() {
        let data = builder().build().unwrap();
        let route = data.route(&rid("A")).unwrap();
        assert_eq!(data.trips_for_route(route).count(), 5);
        assert!(data.route_operates_on(&rid("A"), query_date()));
        assert!(!data.route_operates_on(&rid("A"), service_range().end.succ_opt().unwrap()));

        let morning = crate::domain::TimeRange::new(t("07:00"), t("08:05"));
        let night = crate::domain::TimeRange::new(t("22:00"), t("23:00"));
        assert!(data.route_runs_during(&rid("A"), query_date(), &morning));
        assert!(!data.route_runs_during(&rid("A"), query_date(), &night));
    }

    #[test]
    fn no_stations_is_fatal() {
        let result = TransportDataBuilder::new().build();
        assert!(matches!(result, Err(BuildError::NoStations)));
    }

    #[test]
    fn duplicate_station_is_fatal() {
        let result = builder().station(station("First", -2.5)).build();
        assert!(matches!(
            result,
            Err(BuildError::DuplicateId { kind: "station", .. })
        ));
    }

    #[test]
    fn trip_with_unknown_station_is_excluded() {
        let data = builder()
            .trip(trip("X1", "A", "12:00", &[("First", 0), ("Nowhere", 5)]))
            .build()
            .unwrap();
        assert!(data.trip(&TripId::parse("X1").unwrap()).is_none());
        assert_eq!(data.exclusions().len(), 1);
        assert_eq!(
            data.exclusions()[0].reason,
            ExclusionReason::UnknownStation(sid("Nowhere"))
        );
    }

    #[test]
    fn implausible_leg_is_excluded_unless_marine() {
        let data = builder()
            .trip(trip("X1", "A", "01:00", &[("First", 0), ("Second", 13 * 60)]))
            .build()
            .unwrap();
        assert!(data.trip(&TripId::parse("X1").unwrap()).is_none());
        assert!(matches!(
            data.exclusions()[0].reason,
            ExclusionReason::ImplausibleLeg { minutes: 780, .. }
        ));

        let agency = crate::domain::AgencyId::parse("TEST").unwrap();
        let data = builder()
            .route(Route::new(rid("F"), "F", "Ferry", agency, TransportMode::Ferry))
            .trip(trip("F1", "F", "01:00", &[("First", 0), ("Beyond", 13 * 60)]))
            .build()
            .unwrap();
        assert!(data.trip(&TripId::parse("F1").unwrap()).is_some());
    }

    #[test]
    fn negative_leg_is_excluded() {
        let mut bad = trip("X1", "A", "12:00", &[("First", 0), ("Second", 5)]);
        bad.calls[1] = StopCall::new(2, sid("Second"), t("11:00"), t("11:00"));
        let data = builder().trip(bad).build().unwrap();
        assert!(matches!(
            data.exclusions()[0].reason,
            ExclusionReason::NegativeLeg { .. }
        ));
    }

    #[test]
    fn service_without_days_excludes_its_trips_and_routes() {
        let agency = crate::domain::AgencyId::parse("TEST").unwrap();
        let never = Service::new(
            ServiceId::parse("NEVER").unwrap(),
            Calendar::new(service_range(), DaysOfWeek::empty()),
        );
        let mut c_trip = trip("C1", "C", "12:00", &[("First", 0), ("Beyond", 20)]);
        c_trip.service = never.id.clone();
        let data = builder()
            .service(never)
            .route(Route::new(rid("C"), "C", "Never", agency, TransportMode::Bus))
            .trip(c_trip)
            .build()
            .unwrap();

        let kinds: Vec<_> = data.exclusions().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec!["service", "trip", "route"]);
        assert!(data.route(&rid("C")).is_none());
        assert!(!data.station(&sid("First")).unwrap().modes.contains(&TransportMode::Bus));
    }

    #[test]
    fn mode_filter_excludes_routes() {
        let data = builder().only_modes([TransportMode::Bus]).build();
        let data = data.unwrap();
        assert_eq!(data.route_count(), 0);
        assert_eq!(data.trips().count(), 0);
        assert!(!data.station(&sid("First")).unwrap().is_served());
    }

    #[test]
    fn platforms_are_derived_from_calls() {
        let mut with_platform = trip("P1", "A", "12:00", &[("First", 0), ("Second", 4)]);
        with_platform.calls[0] = with_platform.calls[0].clone().at_platform("2");
        let data = builder().trip(with_platform).build().unwrap();

        let first = data.station(&sid("First")).unwrap();
        let platform_id = crate::domain::PlatformId::parse("First2").unwrap();
        assert!(first.platforms.contains(&platform_id));
        let platform = data.platform(&platform_id).unwrap();
        assert_eq!(platform.station, sid("First"));
        assert!(platform.routes.contains(&rid("A")));
    }

    #[test]
    fn groups_derive_location_and_routes() {
        let group = StationGroup::new(
            StationGroupId::parse("G").unwrap(),
            "Middle",
            [sid("Second"), sid("Interchange"), sid("Unknown")],
        );
        let empty = StationGroup::new(StationGroupId::parse("E").unwrap(), "Empty", [sid("Unknown")]);
        let data = builder().group(group).group(empty).build().unwrap();

        let group = data.group(&StationGroupId::parse("G").unwrap()).unwrap();
        assert_eq!(group.members.len(), 2);
        let location = group.location.unwrap();
        assert!((location.lon() - -1.985).abs() < 1e-9);
        assert!(group.pickup_routes.contains(&rid("B")));
        assert!(group.dropoff_routes.contains(&rid("A")));

        assert!(data.group(&StationGroupId::parse("E").unwrap()).is_none());
        assert_eq!(data.exclusions()[0].reason, ExclusionReason::EmptyGroup);
    }

    #[test]
    fn snapshot_from_json() {
        let json = r#"{
            "stations": [
                {"id": "S1", "name": "One", "location": {"lat": 53.0, "lon": -2.0}},
                {"id": "S2", "name": "Two", "location": {"lat": 53.0, "lon": -2.01}}
            ],
            "agencies": [{"id": "AG", "name": "Agency"}],
            "routes": [{"id": "R", "short_name": "R", "name": "Route", "agency": "AG", "mode": "bus"}],
            "services": [{"id": "SV", "calendar": {
                "range": {"start": "2024-03-11", "end": "2024-03-24"},
                "days": ["Mon", "Fri"]
            }}],
            "trips": [{"id": "T", "route": "R", "service": "SV", "calls": [
                {"sequence": 1, "station": "S1", "arrival": "09:00", "departure": "09:00"},
                {"sequence": 2, "station": "S2", "arrival": "09:07", "departure": "09:07"}
            ]}]
        }"#;
        let data = TransportDataSnapshot::from_json_str(json)
            .unwrap()
            .into_builder()
            .build()
            .unwrap();
        assert_eq!(data.station_count(), 2);
        assert!(data.route_operates_on(&rid("R"), query_date()));
        assert!(data.bounds().contains(&ll(53.0, -2.005)));
    }

    #[test]
    fn snapshot_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            TransportDataSnapshot::from_json_file(&missing),
            Err(BuildError::Io(_))
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(matches!(
            TransportDataSnapshot::from_json_file(&bad),
            Err(BuildError::Json(_))
        ));
    }
}
