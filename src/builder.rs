//! Builder for spatial index creation requests.
//!
//! `SpatialIndexBuilder` assembles an [`IndexConfig`] field by field and
//! validates it on `build()`, so a bad request is rejected before any
//! collection state is touched.
//!
//! ```rust
//! use geoindex::{IndexKind, SpatialIndexBuilder};
//!
//! let config = SpatialIndexBuilder::haystack("pos", "type", 1.0)
//!     .bucket_overlap(0.1)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.kind, IndexKind::Haystack);
//! ```

use crate::compute::spatial::SpatialIndex;
use crate::config::{CoordinateSource, IndexConfig};
use crate::db::Collection;
use crate::error::Result;

/// Builder for a `CreateSpatialIndex` request.
#[derive(Debug, Clone)]
pub struct SpatialIndexBuilder {
    config: IndexConfig,
}

impl SpatialIndexBuilder {
    /// Flat2D index on `location_field` with default range and precision.
    pub fn flat(location_field: impl Into<String>) -> Self {
        Self {
            config: IndexConfig::flat(location_field),
        }
    }

    /// Haystack index on `location_field`, bucketed by `bucket_field`.
    pub fn haystack(
        location_field: impl Into<String>,
        bucket_field: impl Into<String>,
        bucket_size: f64,
    ) -> Self {
        Self {
            config: IndexConfig::haystack(location_field, bucket_field, bucket_size),
        }
    }

    /// Coordinate range `[min, max)` applied to both axes.
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.config.min = min;
        self.config.max = max;
        self
    }

    /// Geohash precision per axis.
    pub fn bits(mut self, bits: u8) -> Self {
        self.config.bits = bits;
        self
    }

    /// Compound field stored with every Flat2D entry.
    pub fn secondary_field(mut self, field: impl Into<String>) -> Self {
        self.config.secondary_field = Some(field.into());
        self
    }

    pub fn bucket_overlap(mut self, overlap: f64) -> Self {
        self.config.bucket_overlap = overlap;
        self
    }

    pub fn coordinate_source(mut self, source: CoordinateSource) -> Self {
        self.config.coordinate_source = Some(source);
        self
    }

    /// Shorthand for `{ <x_key>: x, <y_key>: y }` locations.
    pub fn object_fields(self, x_key: impl Into<String>, y_key: impl Into<String>) -> Self {
        self.coordinate_source(CoordinateSource::ObjectFields {
            x_key: x_key.into(),
            y_key: y_key.into(),
        })
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<IndexConfig> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Validate and create the index on `collection`.
    pub fn create_on(self, collection: &Collection) -> Result<SpatialIndex> {
        collection.create_spatial_index(self.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeoIndexError;
    use crate::config::IndexKind;

    #[test]
    fn test_builder_defaults() {
        let config = SpatialIndexBuilder::flat("loc").build().unwrap();
        assert_eq!(config, IndexConfig::flat("loc"));
        assert_eq!(config.kind, IndexKind::Flat2d);
    }

    #[test]
    fn test_builder_options() {
        let config = SpatialIndexBuilder::flat("addresses.loc")
            .range(0.0, 1024.0)
            .bits(10)
            .secondary_field("category")
            .object_fields("x", "y")
            .build()
            .unwrap();
        assert_eq!(config.cell_edge(), 1.0);
        assert_eq!(config.secondary_field.as_deref(), Some("category"));
        assert!(matches!(
            config.coordinate_source,
            Some(CoordinateSource::ObjectFields { .. })
        ));
    }

    #[test]
    fn test_builder_rejects_bad_config() {
        for builder in [
            SpatialIndexBuilder::flat("loc").bits(0),
            SpatialIndexBuilder::flat("loc").bits(33),
            SpatialIndexBuilder::flat("loc").range(10.0, -10.0),
            SpatialIndexBuilder::haystack("pos", "type", 0.0),
            SpatialIndexBuilder::haystack("pos", "type", 1.0).bucket_overlap(1.0),
        ] {
            assert!(matches!(builder.build(), Err(GeoIndexError::Config(_))));
        }
    }

    #[test]
    fn test_create_on_collection() {
        let collection = Collection::new("places");
        let index = SpatialIndexBuilder::flat("loc").create_on(&collection).unwrap();
        assert_eq!(index.location_field(), "loc");
        assert!(collection.spatial_index().is_some());
    }
}
