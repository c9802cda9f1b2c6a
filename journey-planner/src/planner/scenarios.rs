//! End-to-end journey planning over the synthetic test network.

use std::sync::OnceLock;

use chrono::Duration;
use proptest::prelude::*;

use super::*;
use crate::data::{StationClosure, TransportDataBuilder};
use crate::domain::{
    Agency, AgencyId, Calendar, DaysOfWeek, Journey, Route, Service, ServiceId, Stage, StageLocation,
    StationGroup, StationGroupId, StationId, TransportMode,
};
use crate::network::TransitNetwork;
use crate::test_support::{
    builder, config, ll, network, network_with, query_date, rid, service_range, sid, station, t, trip,
};

const STATIONS: [&str; 5] = ["First", "Second", "Interchange", "Last", "Beyond"];

fn shared() -> &'static TransitNetwork {
    static NETWORK: OnceLock<TransitNetwork> = OnceLock::new();
    NETWORK.get_or_init(network)
}

fn request(from: &str, to: &str, at: &str) -> JourneyRequest {
    JourneyRequest::new(sid(from), sid(to), query_date(), t(at), &config().search)
}

fn plan(network: &TransitNetwork, request: &JourneyRequest) -> SearchResult {
    network
        .calculator()
        .calculate(request, &CancelFlag::new())
        .unwrap()
}

fn routes(journey: &Journey) -> Vec<String> {
    journey
        .vehicle_stages()
        .map(|v| v.route().to_string())
        .collect()
}

fn assert_consistent(journey: &Journey) {
    for pair in journey.stages().windows(2) {
        assert_eq!(pair[0].destination(), pair[1].origin());
        assert!(pair[1].departure_time() >= pair[0].arrival_time());
    }
}

#[test]
fn direct_journey_without_changes() {
    let result = plan(shared(), &request("First", "Last", "08:00").with_max_changes(0));

    assert_eq!(result.journeys.len(), 1);
    let journey = &result.journeys[0];
    assert_eq!(routes(journey), vec!["A"]);
    assert_eq!(journey.change_count(), 0);
    assert_eq!(journey.departure_time(), t("08:00"));
    assert_eq!(journey.arrival_time(), t("08:12"));

    let Stage::Vehicle(ride) = &journey.stages()[0] else {
        panic!("expected a vehicle stage");
    };
    assert_eq!(ride.board_station(), &sid("First"));
    assert_eq!(ride.alight_station(), &sid("Last"));
    assert_eq!(ride.passed_stops(), 2);
    assert_eq!(ride.headsign(), "Last");
}

#[test]
fn change_needed_but_not_allowed() {
    let result = plan(shared(), &request("First", "Beyond", "08:00").with_max_changes(0));
    assert!(result.is_exhausted());

    let result = plan(shared(), &request("First", "Beyond", "08:00").with_max_changes(1));
    assert_eq!(result.journeys.len(), 1);
    let journey = &result.journeys[0];
    assert_eq!(routes(journey), vec!["A", "B"]);
    assert_eq!(journey.change_count(), 1);
    assert_eq!(journey.vehicle_stages().next().unwrap().alight_station(), &sid("Interchange"));
    assert_eq!(journey.arrival_time(), t("08:25"));
}

#[test]
fn both_routes_from_interchange_ranked_by_arrival() {
    let result = plan(shared(), &request("Interchange", "Last", "08:00"));

    assert_eq!(result.journeys.len(), 2);
    assert_eq!(routes(&result.journeys[0]), vec!["A"]);
    assert_eq!(result.journeys[0].arrival_time(), t("08:12"));
    assert_eq!(routes(&result.journeys[1]), vec!["B"]);
    assert_eq!(result.journeys[1].arrival_time(), t("08:20"));
}

#[test]
fn routes_meet_at_interchange() {
    let network = shared();
    assert_eq!(network.costs().get_for(&rid("A"), &rid("B")), Some(1));
    let changes = network
        .number_of_changes(&Location::Station(sid("First")), &Location::Station(sid("Beyond")))
        .unwrap()
        .unwrap();
    assert_eq!((changes.min, changes.max), (1, 1));
}

#[test]
fn closed_interchange_removes_journeys() {
    let mut config = config();
    config
        .closures
        .push(StationClosure::new([sid("Interchange")], query_date(), query_date()));
    let network = network_with(&config);

    let result = plan(&network, &request("First", "Beyond", "08:00"));
    assert!(result.is_exhausted());

    // Trips no longer run through the closed station
    let result = plan(&network, &request("First", "Last", "08:00"));
    assert!(result.is_exhausted());

    let mut next_day = request("First", "Beyond", "08:00");
    next_day.date = query_date().succ_opt().unwrap();
    let result = plan(&network, &next_day);
    assert_eq!(result.journeys.len(), 1);
    assert!(result.journeys[0].call_points().contains(&sid("Interchange")));
}

#[test]
fn stations_near_a_coordinate_between_first_and_second() {
    let near = shared().stations_near(&ll(53.0, -1.996), 600.0);
    let ids: Vec<&str> = near.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["First", "Second"]);
    assert!(near[0].distance_m < near[1].distance_m);
}

#[test]
fn stations_near_with_a_huge_radius_returns_everything() {
    for radius in [1e8, 1e10] {
        let near = shared().stations_near(&ll(53.0, -1.996), radius);
        let ids: Vec<&str> = near.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["First", "Second", "Interchange", "Last", "Beyond"]);
    }
}

/// Route S only: one trip runs First to Interchange, a later one
/// Interchange to Last.
fn short_working_network() -> TransitNetwork {
    let agency = AgencyId::parse("TEST").unwrap();
    let data = TransportDataBuilder::new()
        .station(station("First", -2.00))
        .station(station("Interchange", -1.98).marked_interchange())
        .station(station("Last", -1.97))
        .agency(Agency::new(agency.clone(), "Test Trams"))
        .route(Route::new(rid("S"), "S", "First - Last", agency, TransportMode::Tram))
        .service(Service::new(
            ServiceId::parse("DAILY").unwrap(),
            Calendar::new(service_range(), DaysOfWeek::ALL),
        ))
        .trip(trip("S0", "S", "08:00", &[("First", 0), ("Interchange", 8)]))
        .trip(trip("S1", "S", "08:20", &[("Interchange", 0), ("Last", 5)]))
        .build()
        .unwrap();
    TransitNetwork::build(data, &config())
}

#[test]
fn changing_trips_on_the_same_route_is_not_a_change() {
    let network = short_working_network();
    let result = plan(&network, &request("First", "Last", "08:00").with_max_changes(0));

    assert_eq!(result.journeys.len(), 1);
    let journey = &result.journeys[0];
    assert_consistent(journey);
    assert_eq!(routes(journey), vec!["S", "S"]);
    let trips: Vec<String> = journey.vehicle_stages().map(|v| v.trip().to_string()).collect();
    assert_eq!(trips, vec!["S0", "S1"]);
    assert_eq!(journey.change_count(), 0);
    assert_eq!(journey.departure_time(), t("08:00"));
    assert_eq!(journey.arrival_time(), t("08:25"));
}

#[test]
fn staying_aboard_beats_changing_to_a_later_trip() {
    // A0 reaches Last at 08:12; hopping off at Second onto A1 cannot win
    let result = plan(shared(), &request("First", "Last", "08:00"));
    assert_eq!(result.journeys.len(), 1);
    assert_eq!(result.journeys[0].vehicle_stages().count(), 1);
}

#[test]
fn journey_from_a_coordinate_starts_with_a_walk() {
    let request = JourneyRequest::new(
        ll(53.0, -1.996),
        sid("Last"),
        query_date(),
        t("08:25"),
        &config().search,
    );
    let result = plan(shared(), &request);

    assert!(!result.is_exhausted());
    let journey = &result.journeys[0];
    assert_consistent(journey);
    let (Stage::Walk(walk), Stage::Vehicle(ride)) = (&journey.stages()[0], &journey.stages()[1]) else {
        panic!("expected a walk then a ride");
    };
    assert!(matches!(walk.from, StageLocation::Coordinate(_)));
    assert_eq!(walk.to, StageLocation::Station(sid("First")));
    assert_eq!(walk.arrival_time(), ride.departure_time());
    assert_eq!(ride.departure_time(), t("08:30"));
    assert_eq!(journey.arrival_time(), t("08:42"));
}

#[test]
fn journey_to_a_coordinate_ends_with_a_walk() {
    // Nearest to Beyond, then Last
    let request = JourneyRequest::new(
        sid("First"),
        ll(53.0, -1.962),
        query_date(),
        t("08:00"),
        &config().search,
    );
    let result = plan(shared(), &request);

    assert!(!result.is_exhausted());
    for journey in &result.journeys {
        assert_consistent(journey);
        assert!(journey.stages().last().unwrap().is_walk());
        assert!(matches!(journey.destination(), StageLocation::Coordinate(_)));
    }
}

#[test]
fn group_origin_uses_a_member_station() {
    let data = builder()
        .group(StationGroup::new(
            StationGroupId::parse("Start").unwrap(),
            "Start area",
            [sid("First"), sid("Second")],
        ))
        .build()
        .unwrap();
    let network = TransitNetwork::build(data, &config());
    let request = JourneyRequest::new(
        Location::Group(StationGroupId::parse("Start").unwrap()),
        sid("Last"),
        query_date(),
        t("08:00"),
        &config().search,
    );
    let result = plan(&network, &request);

    assert!(!result.is_exhausted());
    let origin = result.journeys[0].origin();
    assert!(origin == StageLocation::Station(sid("First")) || origin == StageLocation::Station(sid("Second")));
}

#[test]
fn walking_link_to_the_destination() {
    let mut config = config();
    config.walking.additional_links.push((sid("Last"), sid("Beyond")));
    let network = network_with(&config);

    let result = plan(&network, &request("First", "Beyond", "08:00"));
    assert_eq!(result.journeys.len(), 1);
    let journey = &result.journeys[0];
    assert_consistent(journey);
    assert_eq!(routes(journey), vec!["A"]);
    assert!(journey.stages()[1].is_walk());
    assert_eq!(journey.change_count(), 0);
    assert_eq!(journey.arrival_time(), t("08:21"));
}

#[test]
fn minimum_change_time_is_respected() {
    let mut config = config();
    config.search.min_change_mins = 10;
    let network = network_with(&config);

    let result = plan(&network, &request("First", "Beyond", "08:00"));
    assert_eq!(result.journeys.len(), 1);
    let stages: Vec<_> = result.journeys[0].vehicle_stages().collect();
    assert!(stages[1].departure_time().signed_duration_since(stages[0].arrival_time()) >= Duration::minutes(10));
    assert_eq!(result.journeys[0].arrival_time(), t("08:55"));
}

#[test]
fn change_anywhere_allows_changes_at_ordinary_stations() {
    let mut strict = config();
    strict.interchanges.force_remove.insert(sid("Interchange"));
    let result = plan(&network_with(&strict), &request("First", "Beyond", "08:00"));
    assert!(result.is_exhausted());

    let mut anywhere = strict.clone();
    anywhere.search.change_at_interchange_only = false;
    let result = plan(&network_with(&anywhere), &request("First", "Beyond", "08:00"));
    assert_eq!(result.journeys.len(), 1);
    assert_eq!(result.journeys[0].arrival_time(), t("08:25"));
}

#[test]
fn excluded_modes_find_nothing() {
    let request = request("First", "Last", "08:00").with_modes([TransportMode::Bus]);
    assert!(plan(shared(), &request).is_exhausted());
}

#[test]
fn first_vehicle_must_leave_within_initial_wait() {
    assert!(plan(shared(), &request("First", "Last", "07:00")).is_exhausted());
    assert!(!plan(shared(), &request("First", "Last", "07:40")).is_exhausted());
}

#[test]
fn journeys_longer_than_max_duration_are_dropped() {
    let request = request("First", "Last", "08:00").with_max_duration(Duration::minutes(10));
    assert!(plan(shared(), &request).is_exhausted());
}

#[test]
fn several_candidate_times() {
    let mut config = config();
    config.search.number_of_queries = 3;
    let network = network_with(&config);

    let result = plan(&network, &request("First", "Last", "08:00"));
    assert_eq!(result.candidates_searched, 3);
    let arrivals: Vec<_> = result.journeys.iter().map(Journey::arrival_time).collect();
    assert_eq!(arrivals, vec![t("08:12"), t("08:42")]);
}

#[test]
fn arrive_by_prefers_latest_departure() {
    let request = request("First", "Last", "09:00").arriving_by();
    let result = plan(shared(), &request);

    assert!(!result.is_exhausted());
    assert_eq!(result.journeys[0].departure_time(), t("08:30"));
    assert_eq!(result.journeys[0].arrival_time(), t("08:42"));
    for journey in &result.journeys {
        assert!(journey.arrival_time() <= t("09:00"));
    }
    let departures: Vec<_> = result.journeys.iter().map(Journey::departure_time).collect();
    let mut sorted = departures.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(departures, sorted);
}

#[test]
fn cancelled_and_timed_out_searches() {
    let cancel = CancelFlag::new();
    cancel.cancel();
    let result = shared()
        .calculator()
        .calculate(&request("First", "Last", "08:00"), &cancel);
    assert_eq!(result.unwrap_err(), SearchError::Aborted);

    let mut config = config();
    config.search.timeout_ms = 0;
    let result = network_with(&config)
        .calculator()
        .calculate(&request("First", "Last", "08:00"), &CancelFlag::new());
    assert_eq!(result.unwrap_err(), SearchError::Timeout);
}

#[test]
fn state_limit_ends_search_quietly() {
    let mut config = config();
    config.search.max_states = 1;
    let result = plan(&network_with(&config), &request("First", "Last", "08:00"));
    assert!(result.is_exhausted());
    assert_eq!(result.states_explored, 1);
}

#[test]
fn search_is_repeatable() {
    let request = request("First", "Beyond", "08:00");
    let a = plan(shared(), &request);
    let b = plan(&network_with(&config()), &request);
    assert_eq!(a.journeys, b.journeys);
}

fn station_pair() -> impl Strategy<Value = (&'static str, &'static str)> {
    (0..STATIONS.len(), 0..STATIONS.len())
        .prop_filter("distinct stations", |(a, b)| a != b)
        .prop_map(|(a, b)| (STATIONS[a], STATIONS[b]))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn journeys_are_valid_and_within_limits(
        (from, to) in station_pair(),
        minutes in 420u16..660,
        max_changes in 0i32..3,
    ) {
        let request = JourneyRequest::new(
            sid(from),
            sid(to),
            query_date(),
            crate::domain::ServiceTime::from_minutes(minutes).unwrap(),
            &config().search,
        )
        .with_max_changes(max_changes);
        let result = plan(shared(), &request);

        for journey in &result.journeys {
            prop_assert!(journey.change_count() <= max_changes as usize);
            prop_assert!(journey.total_duration() <= request.max_duration);
            prop_assert!(journey.departure_time() >= request.time);
            prop_assert_eq!(journey.origin(), StageLocation::Station(sid(from)));
            prop_assert_eq!(journey.destination(), StageLocation::Station(sid(to)));
            for pair in journey.stages().windows(2) {
                prop_assert_eq!(pair[0].destination(), pair[1].origin());
                prop_assert!(pair[1].departure_time() >= pair[0].arrival_time());
            }
        }
    }

    #[test]
    fn route_cost_bound_never_overestimates(
        (from, to) in station_pair(),
        minutes in 420u16..660,
    ) {
        let network = shared();
        let request = JourneyRequest::new(
            sid(from),
            sid(to),
            query_date(),
            crate::domain::ServiceTime::from_minutes(minutes).unwrap(),
            &config().search,
        );
        let result = plan(network, &request);
        let bound = network
            .number_of_changes(&Location::Station(sid(from)), &Location::Station(sid(to)))
            .unwrap();

        if let Some(fewest) = result.journeys.iter().map(Journey::change_count).min() {
            let bound = bound.expect("a journey exists, so the stations are connected");
            prop_assert!(bound.min <= fewest);
        }
    }

    #[test]
    fn arrive_by_results_arrive_in_time(
        (from, to) in station_pair(),
        minutes in 480u16..720,
    ) {
        let target = crate::domain::ServiceTime::from_minutes(minutes).unwrap();
        let request = JourneyRequest::new(sid(from), sid(to), query_date(), target, &config().search)
            .arriving_by();
        let result = plan(shared(), &request);
        for journey in &result.journeys {
            prop_assert!(journey.arrival_time() <= target);
        }
    }
}

#[test]
fn station_ids_in_scenarios_exist() {
    let network = shared();
    for id in STATIONS {
        assert!(network.data().station(&StationId::parse(id).unwrap()).is_some());
    }
}
