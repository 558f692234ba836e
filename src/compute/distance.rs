//! Flat and spherical distance evaluation.
//!
//! Flat distances are in the index's native coordinate units. Spherical
//! distances treat `x` as longitude and `y` as latitude in degrees and are
//! returned in radians unless a radius is supplied.

use crate::compute::validation::validate_latitude;
use crate::error::Result;
use geo::{Distance, Euclidean, HaversineMeasure, Point};
use serde::{Deserialize, Serialize};

/// Equatorial earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6378.137;
/// Equatorial earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3963.192;
/// Equatorial earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = EARTH_RADIUS_KM * 1000.0;

/// Distance metric used to rank and filter results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    /// Planar Euclidean distance in coordinate units.
    #[default]
    Flat,
    /// Great-circle distance in radians.
    Spherical,
}

/// Unit for converting spherical (radian) distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    #[default]
    Radians,
    Kilometers,
    Miles,
    Meters,
}

impl DistanceUnit {
    /// Sphere radius that turns radians into this unit.
    pub fn earth_radius(self) -> f64 {
        match self {
            DistanceUnit::Radians => 1.0,
            DistanceUnit::Kilometers => EARTH_RADIUS_KM,
            DistanceUnit::Miles => EARTH_RADIUS_MILES,
            DistanceUnit::Meters => EARTH_RADIUS_METERS,
        }
    }

    pub fn from_radians(self, radians: f64) -> f64 {
        radians * self.earth_radius()
    }

    pub fn to_radians(self, distance: f64) -> f64 {
        distance / self.earth_radius()
    }
}

/// Euclidean distance between two points.
///
/// ```rust
/// use geoindex::compute::distance::flat_distance;
/// use geoindex::Point;
///
/// assert_eq!(flat_distance(&Point::new(0.0, 0.0), &Point::new(3.0, 4.0)), 5.0);
/// ```
pub fn flat_distance(a: &Point, b: &Point) -> f64 {
    Euclidean.distance(*a, *b)
}

/// Largest per-axis difference (the square window a haystack search covers).
pub fn window_distance(a: &Point, b: &Point) -> f64 {
    (a.x() - b.x()).abs().max((a.y() - b.y()).abs())
}

/// Great-circle angle between two points, in radians.
///
/// Callers are expected to have validated latitudes.
pub fn haversine_radians(a: &Point, b: &Point) -> f64 {
    HaversineMeasure::new(1.0).distance(*a, *b)
}

/// Great-circle distance on a sphere of `radius`; `radius = 1` yields radians.
///
/// Rejects latitudes outside `[-90, 90]` with `LatitudeRange`.
///
/// ```rust
/// use geoindex::compute::distance::{spherical_distance, EARTH_RADIUS_KM};
/// use geoindex::Point;
///
/// let a = Point::new(-74.0, 40.74);
/// let b = Point::new(-73.0, 40.0);
/// let radians = spherical_distance(&a, &b, 1.0).unwrap();
/// assert!((radians - 0.0185).abs() < 1e-4);
/// let km = spherical_distance(&a, &b, EARTH_RADIUS_KM).unwrap();
/// assert!((km - radians * EARTH_RADIUS_KM).abs() < 1e-9);
/// ```
pub fn spherical_distance(a: &Point, b: &Point, radius: f64) -> Result<f64> {
    validate_latitude(a.y())?;
    validate_latitude(b.y())?;
    Ok(HaversineMeasure::new(radius).distance(*a, *b))
}

impl DistanceMetric {
    /// Distance between two already-validated points under this metric.
    pub fn distance(self, a: &Point, b: &Point) -> f64 {
        match self {
            DistanceMetric::Flat => flat_distance(a, b),
            DistanceMetric::Spherical => haversine_radians(a, b),
        }
    }

    pub fn is_spherical(self) -> bool {
        matches!(self, DistanceMetric::Spherical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeoIndexError;

    #[test]
    fn test_flat_distance_identity_and_value() {
        let a = Point::new(126.9, 35.2);
        assert_eq!(flat_distance(&a, &a), 0.0);
        let b = Point::new(1.0, 1.0);
        let c = Point::new(4.0, 5.0);
        assert!((flat_distance(&b, &c) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_distance() {
        let a = Point::new(127.5, 36.1);
        let b = Point::new(126.9, 35.2);
        assert!((window_distance(&a, &b) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_spherical_symmetry() {
        let pairs = [
            (Point::new(-74.0, 40.74), Point::new(-73.0, 40.0)),
            (Point::new(0.0, 89.0), Point::new(120.0, -45.0)),
            (Point::new(179.0, 0.0), Point::new(-179.0, 0.0)),
        ];
        for (a, b) in pairs {
            let ab = spherical_distance(&a, &b, 1.0).unwrap();
            let ba = spherical_distance(&b, &a, 1.0).unwrap();
            assert!((ab - ba).abs() < 1e-15);
        }
    }

    #[test]
    fn test_spherical_known_values() {
        let a = Point::new(-74.0, 40.74);
        let b = Point::new(-73.0, 40.0);
        let d = spherical_distance(&a, &b, 1.0).unwrap();
        assert!((d - 0.018_536).abs() < 1e-5, "got {}", d);

        // quarter meridian
        let equator = Point::new(0.0, 0.0);
        let pole = Point::new(0.0, 90.0);
        let d = spherical_distance(&equator, &pole, 1.0).unwrap();
        assert!((d - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_spherical_radius_scales_result() {
        let a = Point::new(2.35, 48.86);
        let b = Point::new(-0.13, 51.51);
        let radians = spherical_distance(&a, &b, 1.0).unwrap();
        let miles = spherical_distance(&a, &b, EARTH_RADIUS_MILES).unwrap();
        assert!((miles - radians * EARTH_RADIUS_MILES).abs() < 1e-9);
        assert_eq!(DistanceMetric::Spherical.distance(&a, &b), radians);
    }

    #[test]
    fn test_spherical_rejects_bad_latitude() {
        let a = Point::new(0.0, 91.0);
        let b = Point::new(0.0, 0.0);
        assert!(matches!(
            spherical_distance(&a, &b, 1.0),
            Err(GeoIndexError::LatitudeRange(_))
        ));
    }

    #[test]
    fn test_unit_conversion() {
        let km = DistanceUnit::Kilometers.from_radians(1.0);
        assert_eq!(km, EARTH_RADIUS_KM);
        assert!((DistanceUnit::Miles.to_radians(EARTH_RADIUS_MILES) - 1.0).abs() < 1e-12);
        assert_eq!(DistanceUnit::Radians.from_radians(0.5), 0.5);
    }
}
