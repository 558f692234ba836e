//! Query regions for `Within`.
//!
//! The index only accelerates bounding-box containment; circles and polygons
//! are applied as a post-filter on the entries their bounding box yields.

use crate::compute::distance::{DistanceMetric, flat_distance, haversine_radians};
use crate::compute::validation::{
    validate_distance, validate_finite, validate_polygon, validate_spherical_point,
};
use crate::error::{GeoIndexError, Result};
use geo::{BoundingRect, Intersects, Point, Polygon, Rect, coord};
use std::f64::consts::PI;

/// Region tested by a `Within` query.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Axis-aligned box, bounds inclusive. `min` is the lower-left corner.
    Box { min: Point, max: Point },
    /// Flat circle, radius in coordinate units.
    Circle { center: Point, radius: f64 },
    /// Spherical cap, radius in radians.
    CenterSphere { center: Point, radius: f64 },
    /// Polygon, boundary inclusive.
    Polygon(Polygon),
}

impl Shape {
    pub fn rect(min: Point, max: Point) -> Self {
        Shape::Box { min, max }
    }

    pub fn circle(center: Point, radius: f64) -> Self {
        Shape::Circle { center, radius }
    }

    pub fn center_sphere(center: Point, radius: f64) -> Self {
        Shape::CenterSphere { center, radius }
    }

    pub fn metric(&self) -> DistanceMetric {
        match self {
            Shape::CenterSphere { .. } => DistanceMetric::Spherical,
            _ => DistanceMetric::Flat,
        }
    }

    /// Checks the shape is well formed and does not wrap.
    pub fn validate(&self) -> Result<()> {
        match self {
            Shape::Box { min, max } => {
                validate_finite(min)?;
                validate_finite(max)?;
                if min.x() > max.x() || min.y() > max.y() {
                    return Err(GeoIndexError::Wraparound(format!(
                        "box corners ({}, {}) / ({}, {}) are not ordered lower-left to upper-right",
                        min.x(),
                        min.y(),
                        max.x(),
                        max.y()
                    )));
                }
                Ok(())
            }
            Shape::Circle { center, radius } => {
                validate_finite(center)?;
                validate_distance(*radius, "circle radius")
            }
            Shape::CenterSphere { center, radius } => {
                validate_spherical_point(center)?;
                validate_distance(*radius, "spherical radius")?;
                check_spherical_cap(center, *radius)
            }
            Shape::Polygon(polygon) => validate_polygon(polygon),
        }
    }

    /// Flat bounding rectangle of the region.
    pub fn bounding_rect(&self) -> Option<Rect> {
        match self {
            Shape::Box { min, max } => Some(Rect::new(min.0, max.0)),
            Shape::Circle { center, radius } => Some(Rect::new(
                coord! { x: center.x() - radius, y: center.y() - radius },
                coord! { x: center.x() + radius, y: center.y() + radius },
            )),
            Shape::CenterSphere { center, radius } => {
                let dlat = radius.to_degrees();
                let dlon = cap_longitude_extent(center, *radius);
                Some(Rect::new(
                    coord! { x: center.x() - dlon, y: center.y() - dlat },
                    coord! { x: center.x() + dlon, y: center.y() + dlat },
                ))
            }
            Shape::Polygon(polygon) => polygon.bounding_rect(),
        }
    }

    /// Containment test on a raw coordinate. A point off the sphere is never
    /// inside a `CenterSphere`.
    pub fn contains(&self, point: &Point) -> bool {
        match self {
            Shape::Box { min, max } => {
                point.x() >= min.x()
                    && point.x() <= max.x()
                    && point.y() >= min.y()
                    && point.y() <= max.y()
            }
            Shape::Circle { center, radius } => flat_distance(center, point) <= *radius,
            Shape::CenterSphere { center, radius } => {
                (-90.0..=90.0).contains(&point.y()) && haversine_radians(center, point) <= *radius
            }
            Shape::Polygon(polygon) => polygon.intersects(point),
        }
    }
}

/// Half-width in degrees of longitude of a spherical cap.
fn cap_longitude_extent(center: &Point, radius: f64) -> f64 {
    let ratio = radius.sin() / center.y().to_radians().cos();
    if ratio >= 1.0 || !ratio.is_finite() {
        180.0
    } else {
        ratio.asin().to_degrees()
    }
}

/// Rejects a spherical cap that crosses a pole or the antimeridian.
pub(crate) fn check_spherical_cap(center: &Point, radius: f64) -> Result<()> {
    if radius > PI {
        return Err(GeoIndexError::InvalidQuery(format!(
            "spherical distance {} exceeds half the circumference",
            radius
        )));
    }

    let dlat = radius.to_degrees();
    if center.y() + dlat > 90.0 || center.y() - dlat < -90.0 {
        return Err(GeoIndexError::Wraparound(format!(
            "spherical region around ({}, {}) with radius {} crosses a pole",
            center.x(),
            center.y(),
            radius
        )));
    }

    let dlon = cap_longitude_extent(center, radius);
    if center.x() - dlon < -180.0 || center.x() + dlon > 180.0 {
        return Err(GeoIndexError::Wraparound(format!(
            "spherical region around ({}, {}) with radius {} crosses the antimeridian",
            center.x(),
            center.y(),
            radius
        )));
    }

    Ok(())
}
