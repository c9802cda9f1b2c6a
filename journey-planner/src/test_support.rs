//! A small synthetic network shared by tests.
//!
//! ```text
//! Route A:  First -> Second -> Interchange -> Last            (every 30 min from 08:00)
//! Route B:                     Interchange -> Last -> Beyond  (every 30 min from 08:15)
//! ```
//!
//! Stations sit on a line of latitude 53.0, about 670m apart. Interchange is
//! flagged as an interchange by the source data; nothing else is.

use chrono::NaiveDate;

use crate::config::PlannerConfig;
use crate::data::{TransportData, TransportDataBuilder};
use crate::domain::{
    Agency, AgencyId, Calendar, DateRange, DaysOfWeek, LatLong, Route, RouteId, Service,
    ServiceId, ServiceTime, Station, StationId, StopCall, TransportMode, Trip, TripId,
};
use crate::network::TransitNetwork;

pub fn sid(s: &str) -> StationId {
    StationId::parse(s).unwrap()
}

pub fn rid(s: &str) -> RouteId {
    RouteId::parse(s).unwrap()
}

pub fn t(s: &str) -> ServiceTime {
    ServiceTime::parse_hhmm(s).unwrap()
}

pub fn ll(lat: f64, lon: f64) -> LatLong {
    LatLong::new(lat, lon).unwrap()
}

/// The date tests query on; a Friday inside the service range.
pub fn query_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

pub fn service_range() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 24).unwrap(),
    )
}

pub fn station(id: &str, lon: f64) -> Station {
    Station::new(sid(id), id, ll(53.0, lon)).with_area("Testville")
}

/// A trip calling at `stops`, leaving the first at `start` and taking the
/// given minutes from the start to reach each stop.
pub fn trip(id: &str, route: &str, start: &str, stops: &[(&str, u16)]) -> Trip {
    let start = t(start).minutes();
    let calls = stops
        .iter()
        .enumerate()
        .map(|(index, (station, offset))| {
            let at = ServiceTime::from_minutes(start + offset).unwrap();
            StopCall::new(index as u16 + 1, sid(station), at, at)
        })
        .collect();
    let headsign = stops.last().map(|(s, _)| *s).unwrap_or_default();
    Trip::new(
        TripId::parse(id).unwrap(),
        rid(route),
        ServiceId::parse("DAILY").unwrap(),
        headsign,
        calls,
    )
}

/// The synthetic network before it is built, for tests that add to it.
pub fn builder() -> TransportDataBuilder {
    let agency = AgencyId::parse("TEST").unwrap();
    let mut builder = TransportDataBuilder::new()
        .station(station("First", -2.00))
        .station(station("Second", -1.99))
        .station(station("Interchange", -1.98).marked_interchange())
        .station(station("Last", -1.97))
        .station(station("Beyond", -1.96))
        .agency(Agency::new(agency.clone(), "Test Trams"))
        .route(Route::new(rid("A"), "A", "First - Last", agency.clone(), TransportMode::Tram))
        .route(Route::new(rid("B"), "B", "Interchange - Beyond", agency, TransportMode::Tram))
        .service(Service::new(
            ServiceId::parse("DAILY").unwrap(),
            Calendar::new(service_range(), DaysOfWeek::ALL),
        ));

    for (n, start) in ["08:00", "08:30", "09:00", "09:30", "10:00"].iter().enumerate() {
        builder = builder.trip(trip(
            &format!("A{n}"),
            "A",
            start,
            &[("First", 0), ("Second", 4), ("Interchange", 8), ("Last", 12)],
        ));
    }
    for (n, start) in ["08:15", "08:45", "09:15", "09:45", "10:15"].iter().enumerate() {
        builder = builder.trip(trip(
            &format!("B{n}"),
            "B",
            start,
            &[("Interchange", 0), ("Last", 5), ("Beyond", 10)],
        ));
    }
    builder
}

pub fn transport_data() -> TransportData {
    builder().build().unwrap()
}

/// Defaults with a single candidate query time.
pub fn config() -> PlannerConfig {
    let mut config = PlannerConfig::default();
    config.search.number_of_queries = 1;
    config
}

pub fn network_with(config: &PlannerConfig) -> TransitNetwork {
    TransitNetwork::build(transport_data(), config)
}

pub fn network() -> TransitNetwork {
    network_with(&config())
}
