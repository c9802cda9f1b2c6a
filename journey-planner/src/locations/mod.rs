//! Station locations and walking.
//!
//! A grid index answers "which stations are near this point" for stations
//! and arbitrary coordinates alike. Walking neighbours and the walking cost
//! of a straight-line distance live here too.

mod grid;
mod neighbours;
mod station_locations;

use chrono::Duration;

pub use grid::{GridIndex, Nearby};
pub use neighbours::{Neighbours, NeighboursBuilder};
pub use station_locations::StationLocations;

const METRES_PER_MILE: f64 = 1609.344;

/// Walking time for a straight-line distance, rounded up to whole minutes.
///
/// ```
/// use journey_planner::locations::walking_cost;
///
/// // 3 mph is about 80 metres a minute
/// assert_eq!(walking_cost(400.0, 3.0).num_minutes(), 5);
/// assert_eq!(walking_cost(0.0, 3.0).num_minutes(), 0);
/// ```
pub fn walking_cost(distance_m: f64, speed_mph: f64) -> Duration {
    let metres_per_minute = speed_mph * METRES_PER_MILE / 60.0;
    let minutes = (distance_m.max(0.0) / metres_per_minute).ceil();
    Duration::minutes(minutes as i64)
}
