//! Validation for query and document coordinates.

use crate::error::{GeoIndexError, Result};
use geo::Point;

/// Validates that both components of a point are finite.
///
/// # Examples
///
/// ```
/// use geoindex::compute::validation::validate_finite;
/// use geoindex::Point;
///
/// assert!(validate_finite(&Point::new(-74.0, 40.7)).is_ok());
/// assert!(validate_finite(&Point::new(f64::NAN, 40.7)).is_err());
/// ```
pub fn validate_finite(point: &Point) -> Result<()> {
    let (x, y) = (point.x(), point.y());

    if !x.is_finite() {
        return Err(GeoIndexError::InvalidInput(format!(
            "x must be finite, got: {}",
            x
        )));
    }

    if !y.is_finite() {
        return Err(GeoIndexError::InvalidInput(format!(
            "y must be finite, got: {}",
            y
        )));
    }

    Ok(())
}

/// Validates a latitude-like component for spherical use.
pub fn validate_latitude(lat: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeoIndexError::LatitudeRange(lat));
    }
    Ok(())
}

/// Validates a point used with spherical semantics.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
pub fn validate_spherical_point(point: &Point) -> Result<()> {
    validate_finite(point)?;
    validate_latitude(point.y())?;

    if !(-180.0..=180.0).contains(&point.x()) {
        return Err(GeoIndexError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            point.x()
        )));
    }

    Ok(())
}

/// Validates a non-negative finite distance (radius or maxDistance).
pub fn validate_distance(distance: f64, what: &str) -> Result<()> {
    if !distance.is_finite() || distance < 0.0 {
        return Err(GeoIndexError::InvalidQuery(format!(
            "{} must be a non-negative finite number, got: {}",
            what, distance
        )));
    }
    Ok(())
}

/// Validates every vertex of a query polygon.
pub fn validate_polygon(polygon: &geo::Polygon) -> Result<()> {
    let exterior = polygon.exterior();
    if exterior.0.len() < 4 {
        return Err(GeoIndexError::InvalidQuery(
            "polygon requires at least three distinct vertices".into(),
        ));
    }

    for (idx, coord) in exterior.coords().enumerate() {
        validate_finite(&Point::from(*coord)).map_err(|e| {
            GeoIndexError::InvalidQuery(format!("Polygon vertex at index {}: {}", idx, e))
        })?;
    }

    Ok(())
}
