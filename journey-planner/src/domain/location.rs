//! Geographic positions.

use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::DomainError;

const EARTH_RADIUS_METERS: f64 = 6_372_797.560856;

/// Radius used by the spherical mercator projection.
const MERCATOR_RADIUS_METERS: f64 = 6_378_137.0;

/// Latitude limit of the mercator projection.
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// A WGS84 latitude/longitude pair in degrees.
///
/// Always finite and in range, so equality and hashing are well defined.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawLatLong", into = "RawLatLong")]
pub struct LatLong {
    lat: f64,
    lon: f64,
}

#[derive(Serialize, Deserialize)]
struct RawLatLong {
    lat: f64,
    lon: f64,
}

impl LatLong {
    /// Create a position, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lon: f64) -> Result<Self, DomainError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(DomainError::InvalidCoordinate("must be finite"));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(DomainError::InvalidCoordinate("latitude out of range"));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(DomainError::InvalidCoordinate("longitude out of range"));
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Great-circle distance in metres.
    pub fn distance_to(&self, other: &LatLong) -> f64 {
        let longitude_arc = (self.lon - other.lon).to_radians();
        let latitude_arc = (self.lat - other.lat).to_radians();
        let latitude_h = (latitude_arc * 0.5).sin();
        let latitude_h = latitude_h * latitude_h;
        let longitude_h = (longitude_arc * 0.5).sin();
        let longitude_h = longitude_h * longitude_h;
        let tmp = self.lat.to_radians().cos() * other.lat.to_radians().cos();
        EARTH_RADIUS_METERS * 2.0 * (latitude_h + tmp * longitude_h).sqrt().asin()
    }

    /// Arithmetic mean of a set of positions, `None` if empty.
    pub fn centroid<'a>(points: impl IntoIterator<Item = &'a LatLong>) -> Option<LatLong> {
        let (mut lat, mut lon, mut count) = (0.0, 0.0, 0usize);
        for point in points {
            lat += point.lat;
            lon += point.lon;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(LatLong {
            lat: lat / count as f64,
            lon: lon / count as f64,
        })
    }
}

impl PartialEq for LatLong {
    fn eq(&self, other: &Self) -> bool {
        self.lat.to_bits() == other.lat.to_bits() && self.lon.to_bits() == other.lon.to_bits()
    }
}

impl Eq for LatLong {}

impl Hash for LatLong {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lat.to_bits().hash(state);
        self.lon.to_bits().hash(state);
    }
}

impl TryFrom<RawLatLong> for LatLong {
    type Error = DomainError;

    fn try_from(value: RawLatLong) -> Result<Self, Self::Error> {
        LatLong::new(value.lat, value.lon)
    }
}

impl From<LatLong> for RawLatLong {
    fn from(value: LatLong) -> Self {
        RawLatLong {
            lat: value.lat,
            lon: value.lon,
        }
    }
}

/// A position projected onto a planar grid (spherical mercator metres).
///
/// Grid distances are stretched by `1 / cos(latitude)`; use
/// [`GridPosition::scale_at`] to convert ground metres into grid units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridPosition {
    pub easting: f64,
    pub northing: f64,
}

impl GridPosition {
    /// Project a latitude/longitude.
    pub fn project(point: &LatLong) -> Self {
        let lat = point.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
        let easting = MERCATOR_RADIUS_METERS * point.lon.to_radians();
        let northing = MERCATOR_RADIUS_METERS * (PI / 4.0 + lat / 2.0).tan().ln();
        Self { easting, northing }
    }

    /// Grid units per ground metre at the given latitude.
    pub fn scale_at(lat: f64) -> f64 {
        let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
        1.0 / lat.cos()
    }
}

/// An axis-aligned latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: LatLong,
    pub max: LatLong,
}

impl BoundingBox {
    /// The smallest box containing all points, `None` if there are none.
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a LatLong>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let (mut min, mut max) = (first, first);
        for point in iter {
            min.lat = min.lat.min(point.lat);
            min.lon = min.lon.min(point.lon);
            max.lat = max.lat.max(point.lat);
            max.lon = max.lon.max(point.lon);
        }
        Some(Self { min, max })
    }

    /// True if the point lies inside the box, edges included.
    pub fn contains(&self, point: &LatLong) -> bool {
        (self.min.lat..=self.max.lat).contains(&point.lat)
            && (self.min.lon..=self.max.lon).contains(&point.lon)
    }

    /// True if the point lies within `margin_m` metres of the box.
    pub fn within_margin(&self, point: &LatLong, margin_m: f64) -> bool {
        let clamped = LatLong {
            lat: point.lat.clamp(self.min.lat, self.max.lat),
            lon: point.lon.clamp(self.min.lon, self.max.lon),
        };
        clamped.distance_to(point) <= margin_m
    }
}
