//! Nearest-station lookup for stations and postcodes.

use tracing::info;

use crate::data::TransportData;
use crate::domain::{BoundingBox, LatLong, PostcodeId, StationId};

use super::{GridIndex, Nearby};

/// Spatial index over every station and postcode in the network.
#[derive(Debug, Clone)]
pub struct StationLocations {
    stations: GridIndex<StationId>,
    postcodes: GridIndex<PostcodeId>,
    bounds: BoundingBox,
}

impl StationLocations {
    pub fn new(data: &TransportData) -> Self {
        let stations = GridIndex::new(data.stations().map(|s| (s.id.clone(), s.location)));
        let postcodes = GridIndex::new(data.postcodes().map(|p| (p.id.clone(), p.location)));
        info!(
            stations = stations.len(),
            postcodes = postcodes.len(),
            "Station location index built"
        );
        Self {
            stations,
            postcodes,
            bounds: data.bounds(),
        }
    }

    /// Stations within `radius_m` of `point`, nearest first, ties by id.
    ///
    /// A point further than `radius_m` outside the network gets an empty
    /// result.
    pub fn find_near(&self, point: &LatLong, radius_m: f64) -> Vec<Nearby<StationId>> {
        if !self.bounds.within_margin(point, radius_m) {
            return Vec::new();
        }
        self.stations.within(point, radius_m)
    }

    /// At most `limit` of the stations [`find_near`](Self::find_near)
    /// returns.
    pub fn nearest(&self, point: &LatLong, radius_m: f64, limit: usize) -> Vec<Nearby<StationId>> {
        let mut found = self.find_near(point, radius_m);
        found.truncate(limit);
        found
    }

    /// Postcodes within `radius_m` of `point`, nearest first.
    pub fn postcodes_near(&self, point: &LatLong, radius_m: f64) -> Vec<Nearby<PostcodeId>> {
        if !self.bounds.within_margin(point, radius_m) {
            return Vec::new();
        }
        self.postcodes.within(point, radius_m)
    }

    /// True if `point` is within `margin_m` of the network's bounding box.
    pub fn is_near_network(&self, point: &LatLong, margin_m: f64) -> bool {
        self.bounds.within_margin(point, margin_m)
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostcodeLocation;
    use crate::test_support::{builder, ll, sid};

    fn ids(found: Vec<Nearby<StationId>>) -> Vec<StationId> {
        found.into_iter().map(|n| n.id).collect()
    }

    #[test]
    fn point_between_first_and_second() {
        let locations = StationLocations::new(&builder().build().unwrap());
        let point = ll(53.0, -1.996);
        let found = locations.find_near(&point, 500.0);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, sid("First"));
        assert_eq!(found[1].id, sid("Second"));
        assert!(found[0].distance_m < found[1].distance_m);
    }

    #[test]
    fn station_finds_itself_first() {
        let locations = StationLocations::new(&builder().build().unwrap());
        let found = locations.find_near(&ll(53.0, -1.98), 1500.0);
        assert_eq!(found.len(), 5);
        assert_eq!(found[0].id, sid("Interchange"));
        assert_eq!(found[0].distance_m, 0.0);
        assert!(found.windows(2).all(|w| w[0].distance_m <= w[1].distance_m));
    }

    #[test]
    fn deterministic() {
        let locations = StationLocations::new(&builder().build().unwrap());
        let point = ll(53.001, -1.985);
        assert_eq!(
            locations.find_near(&point, 2000.0),
            locations.find_near(&point, 2000.0)
        );
    }

    #[test]
    fn nearest_limits_results() {
        let locations = StationLocations::new(&builder().build().unwrap());
        let found = ids(locations.nearest(&ll(53.0, -1.981), 5000.0, 2));
        assert_eq!(found, vec![sid("Interchange"), sid("Second")]);
    }

    #[test]
    fn out_of_bounds_is_empty() {
        let locations = StationLocations::new(&builder().build().unwrap());
        assert!(locations.find_near(&ll(51.5, -0.1), 1600.0).is_empty());
        assert!(!locations.is_near_network(&ll(51.5, -0.1), 1600.0));
    }

    #[test]
    fn postcodes() {
        let data = builder()
            .postcode(PostcodeLocation {
                id: PostcodeId::parse("TV11AA").unwrap(),
                location: ll(53.001, -1.99),
            })
            .build()
            .unwrap();
        let locations = StationLocations::new(&data);
        let found = locations.postcodes_near(&ll(53.0, -1.99), 500.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id.as_str(), "TV11AA");
    }
}
