//! Uniform grid spatial index.

use std::collections::BTreeMap;

use crate::domain::{GridPosition, LatLong};

/// Target number of entries per grid cell.
const ENTRIES_PER_CELL: f64 = 8.0;

/// Cells are never smaller than this on the ground.
const MIN_CELL_METRES: f64 = 100.0;

/// Metres per degree of latitude, near enough for widening a search box.
const METRES_PER_DEGREE: f64 = 111_320.0;

/// Searches reaching further poleward than this scan every cell.
const MAX_BOX_LATITUDE: f64 = 85.0;

/// A search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Nearby<K> {
    pub id: K,
    pub distance_m: f64,
}

#[derive(Debug, Clone)]
struct Entry<K> {
    id: K,
    location: LatLong,
}

/// Points bucketed into square cells of the mercator plane.
///
/// Cells are sized from the density of the indexed points so that each holds
/// a small number of entries. Distances are great-circle distances; the grid
/// only narrows the candidates.
#[derive(Debug, Clone)]
pub struct GridIndex<K> {
    cell_size: f64,
    cells: BTreeMap<(i64, i64), Vec<Entry<K>>>,
    /// Lowest and highest occupied cell coordinates.
    occupied: ((i64, i64), (i64, i64)),
    len: usize,
}

impl<K: Ord + Clone> GridIndex<K> {
    /// Index the given points, sizing cells from their density.
    pub fn new(points: impl IntoIterator<Item = (K, LatLong)>) -> Self {
        let points: Vec<(K, LatLong)> = points.into_iter().collect();
        let cell_size = cell_size_for(&points);
        let mut cells: BTreeMap<(i64, i64), Vec<Entry<K>>> = BTreeMap::new();
        let mut occupied = ((i64::MAX, i64::MAX), (i64::MIN, i64::MIN));
        for (id, location) in &points {
            let (x, y) = cell_of(&GridPosition::project(location), cell_size);
            occupied.0 = (occupied.0.0.min(x), occupied.0.1.min(y));
            occupied.1 = (occupied.1.0.max(x), occupied.1.1.max(y));
            cells.entry((x, y)).or_default().push(Entry {
                id: id.clone(),
                location: *location,
            });
        }
        Self {
            cell_size,
            cells,
            occupied,
            len: points.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Every entry within `radius_m` metres of `point`, nearest first.
    ///
    /// Equal distances are ordered by id so results are deterministic.
    pub fn within(&self, point: &LatLong, radius_m: f64) -> Vec<Nearby<K>> {
        if self.is_empty() || !(radius_m >= 0.0) {
            return Vec::new();
        }

        let mut found = Vec::new();
        let mut visit = |entries: &[Entry<K>]| {
            for entry in entries {
                let distance_m = point.distance_to(&entry.location);
                if distance_m <= radius_m {
                    found.push(Nearby {
                        id: entry.id.clone(),
                        distance_m,
                    });
                }
            }
        };

        match self.cells_to_scan(point, radius_m) {
            CellScan::Nothing => {}
            CellScan::Box((min_x, min_y), (max_x, max_y)) => {
                for x in min_x..=max_x {
                    for (_, entries) in self.cells.range((x, min_y)..=(x, max_y)) {
                        visit(entries);
                    }
                }
            }
            CellScan::Everything => self.cells.values().for_each(|entries| visit(entries)),
        }

        found.sort_by(|a, b| {
            a.distance_m
                .total_cmp(&b.distance_m)
                .then_with(|| a.id.cmp(&b.id))
        });
        found
    }
}

/// Which cells a search visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellScan {
    Nothing,
    /// Inclusive lower and upper cell coordinates.
    Box((i64, i64), (i64, i64)),
    Everything,
}

impl<K> GridIndex<K> {
    /// The search box, clamped to the occupied cells. Falls back to every
    /// cell when the box holds more cells than are occupied, or would reach
    /// too far poleward for mercator to bound it.
    fn cells_to_scan(&self, point: &LatLong, radius_m: f64) -> CellScan {
        // Mercator stretches distances poleward; size the box for the
        // poleward edge of the search.
        let edge_lat = point.lat() + point.lat().signum() * radius_m / METRES_PER_DEGREE;
        if !(edge_lat.abs() < MAX_BOX_LATITUDE) {
            return CellScan::Everything;
        }
        let reach = radius_m * GridPosition::scale_at(edge_lat);
        let centre = GridPosition::project(point);
        let (low_x, low_y) = cell_of_xy(centre.easting - reach, centre.northing - reach, self.cell_size);
        let (high_x, high_y) = cell_of_xy(centre.easting + reach, centre.northing + reach, self.cell_size);

        let ((occ_min_x, occ_min_y), (occ_max_x, occ_max_y)) = self.occupied;
        let (min_x, max_x) = (low_x.max(occ_min_x), high_x.min(occ_max_x));
        let (min_y, max_y) = (low_y.max(occ_min_y), high_y.min(occ_max_y));
        if min_x > max_x || min_y > max_y {
            return CellScan::Nothing;
        }

        let span = (max_x - min_x + 1).saturating_mul(max_y - min_y + 1);
        if !usize::try_from(span).is_ok_and(|span| span <= self.cells.len()) {
            return CellScan::Everything;
        }
        CellScan::Box((min_x, min_y), (max_x, max_y))
    }
}

fn cell_size_for<K>(points: &[(K, LatLong)]) -> f64 {
    let projected: Vec<GridPosition> = points.iter().map(|(_, p)| GridPosition::project(p)).collect();
    let mean_lat = if points.is_empty() {
        0.0
    } else {
        points.iter().map(|(_, p)| p.lat()).sum::<f64>() / points.len() as f64
    };
    let min_cell = MIN_CELL_METRES * GridPosition::scale_at(mean_lat);

    let (mut min_e, mut max_e) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_n, mut max_n) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in &projected {
        min_e = min_e.min(p.easting);
        max_e = max_e.max(p.easting);
        min_n = min_n.min(p.northing);
        max_n = max_n.max(p.northing);
    }
    if projected.len() < 2 {
        return min_cell;
    }

    let area = ((max_e - min_e) * (max_n - min_n)).max(min_cell * min_cell);
    let cells_wanted = (projected.len() as f64 / ENTRIES_PER_CELL).max(1.0);
    (area / cells_wanted).sqrt().max(min_cell)
}

fn cell_of(position: &GridPosition, cell_size: f64) -> (i64, i64) {
    cell_of_xy(position.easting, position.northing, cell_size)
}

fn cell_of_xy(easting: f64, northing: f64, cell_size: f64) -> (i64, i64) {
    (
        (easting / cell_size).floor() as i64,
        (northing / cell_size).floor() as i64,
    )
}
