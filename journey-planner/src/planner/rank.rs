//! Journey ranking for search results.
//!
//! Merges the journeys found for each candidate start time and orders them
//! so the most useful options come first.

use std::cmp::Ordering;

use crate::domain::Journey;

/// Which way results are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankOrder {
    /// Earliest arrival first.
    DepartAfter,
    /// Latest departure first.
    ArriveBy,
}

/// Rank journeys by preference.
///
/// Depart-after journeys are ranked by:
/// 1. Arrival time (earlier is better)
/// 2. Number of changes (fewer is better)
/// 3. Number of stages (fewer is better)
///
/// Arrive-by journeys put the latest departure first, with the same
/// tie-breaks. The sort is stable, so otherwise equal journeys keep their
/// input order.
pub fn rank_journeys(mut journeys: Vec<Journey>, order: RankOrder) -> Vec<Journey> {
    journeys.sort_by(|a, b| compare(a, b, order));
    journeys
}

fn compare(a: &Journey, b: &Journey, order: RankOrder) -> Ordering {
    let primary = match order {
        RankOrder::DepartAfter => a.arrival_time().cmp(&b.arrival_time()),
        RankOrder::ArriveBy => b.departure_time().cmp(&a.departure_time()),
    };
    primary
        .then_with(|| a.change_count().cmp(&b.change_count()))
        .then_with(|| a.stage_count().cmp(&b.stage_count()))
}

/// Remove journeys identical in stages and timing, keeping the first.
pub fn deduplicate(journeys: Vec<Journey>) -> Vec<Journey> {
    let mut result: Vec<Journey> = Vec::with_capacity(journeys.len());
    for journey in journeys {
        if !result.contains(&journey) {
            result.push(journey);
        }
    }
    result
}

/// Merge per-candidate results in candidate order, then rank and cap.
///
/// The output depends only on the order of `candidates`, never on which
/// candidate search finished first.
pub fn merge_candidates(
    candidates: impl IntoIterator<Item = Vec<Journey>>,
    order: RankOrder,
    max_results: usize,
) -> Vec<Journey> {
    let merged = deduplicate(candidates.into_iter().flatten().collect());
    let mut ranked = rank_journeys(merged, order);
    ranked.truncate(max_results);
    ranked
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::domain::{
        RouteId, ServiceTime, Stage, StageLocation, StationId, TransportMode, TripId, VehicleStage,
        VehicleStageParts, WalkStage,
    };

    fn time(s: &str) -> ServiceTime {
        ServiceTime::parse_hhmm(s).unwrap()
    }

    fn sid(s: &str) -> StationId {
        StationId::parse(s).unwrap()
    }

    fn ride(route: &str, from: &str, to: &str, dep: &str, arr: &str) -> Stage {
        Stage::Vehicle(
            VehicleStage::new(VehicleStageParts {
                route: RouteId::parse(route).unwrap(),
                route_name: route.to_string(),
                mode: TransportMode::Tram,
                trip: TripId::parse(&format!("{route}{dep}")).unwrap(),
                board: sid(from),
                alight: sid(to),
                headsign: to.to_string(),
                platform: None,
                departure: time(dep),
                arrival: time(arr),
                passed_stops: 0,
            })
            .unwrap(),
        )
    }

    fn journey(stages: Vec<Stage>) -> Journey {
        Journey::new(stages).unwrap()
    }

    fn direct(dep: &str, arr: &str) -> Journey {
        journey(vec![ride("A", "X", "Y", dep, arr)])
    }

    fn one_change(dep: &str, mid_arr: &str, mid_dep: &str, arr: &str) -> Journey {
        journey(vec![
            ride("A", "X", "M", dep, mid_arr),
            ride("B", "M", "Y", mid_dep, arr),
        ])
    }

    #[test]
    fn rank_by_arrival() {
        let late = direct("10:00", "11:00");
        let early = direct("10:30", "10:45");
        let ranked = rank_journeys(vec![late.clone(), early.clone()], RankOrder::DepartAfter);
        assert_eq!(ranked, vec![early, late]);
    }

    #[test]
    fn equal_arrival_prefers_fewer_changes() {
        let changing = one_change("10:00", "10:10", "10:15", "10:45");
        let direct = direct("10:05", "10:45");
        let ranked = rank_journeys(vec![changing.clone(), direct.clone()], RankOrder::DepartAfter);
        assert_eq!(ranked, vec![direct, changing]);
    }

    #[test]
    fn equal_changes_prefers_fewer_stages() {
        let with_walk = journey(vec![
            ride("A", "X", "Y", "10:00", "10:30"),
            Stage::Walk(WalkStage::new(
                StageLocation::Station(sid("Y")),
                StageLocation::Station(sid("Z")),
                time("10:30"),
                Duration::zero(),
            )),
        ]);
        let plain = journey(vec![ride("A", "X", "Z", "10:00", "10:30")]);
        let ranked = rank_journeys(vec![with_walk.clone(), plain.clone()], RankOrder::DepartAfter);
        assert_eq!(ranked, vec![plain, with_walk]);
    }

    #[test]
    fn arrive_by_prefers_latest_departure() {
        let early = direct("09:00", "09:40");
        let late = direct("09:20", "09:55");
        let ranked = rank_journeys(vec![early.clone(), late.clone()], RankOrder::ArriveBy);
        assert_eq!(ranked, vec![late, early]);
    }

    #[test]
    fn deduplicate_keeps_first() {
        let a = direct("10:00", "10:30");
        let b = direct("10:30", "11:00");
        let result = deduplicate(vec![a.clone(), b.clone(), a.clone()]);
        assert_eq!(result, vec![a, b]);
    }

    #[test]
    fn deduplicate_distinguishes_routes() {
        let a = journey(vec![ride("A", "X", "Y", "10:00", "10:30")]);
        let b = journey(vec![ride("B", "X", "Y", "10:00", "10:30")]);
        assert_eq!(deduplicate(vec![a, b]).len(), 2);
    }

    #[test]
    fn merge_is_order_independent_of_arrival() {
        let first = vec![direct("10:00", "10:30"), direct("10:30", "11:00")];
        let second = vec![direct("10:30", "11:00"), direct("11:00", "11:30")];
        let merged = merge_candidates(vec![first.clone(), second.clone()], RankOrder::DepartAfter, 10);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].arrival_time(), time("10:30"));
        assert_eq!(merged[2].arrival_time(), time("11:30"));

        let capped = merge_candidates(vec![first, second], RankOrder::DepartAfter, 2);
        assert_eq!(capped.len(), 2);
    }
}
