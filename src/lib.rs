//! Embedded geospatial index engine with geohash-ordered and haystack indexes.
//!
//! ```rust
//! use geoindex::{CancellationToken, Collection, GeoQuery, IndexConfig, Point};
//! use serde_json::json;
//!
//! let places = Collection::new("places");
//! places.create_spatial_index(IndexConfig::flat("loc"))?;
//! places.insert("a", json!({ "loc": [-74.0, 40.74] }))?;
//! places.insert("b", json!({ "loc": [-73.0, 40.0] }))?;
//!
//! let query = GeoQuery::near_sphere("loc", Point::new(-74.0, 40.74)).limit(2);
//! let result = places.find(&query, &CancellationToken::new())?;
//! assert_eq!(result.rows.len(), 2);
//! # Ok::<(), geoindex::GeoIndexError>(())
//! ```

pub mod builder;
pub mod cancel;
pub mod compute;
pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod storage;

pub use builder::SpatialIndexBuilder;
pub use cancel::CancellationToken;
pub use config::{CoordinateSource, IndexConfig, IndexKind};
pub use db::{BulkWriteReport, Collection, IndexCatalog};
pub use document::{DocId, SecondaryValue};
pub use error::{GeoIndexError, Result};

pub use geo::{Point, Polygon, Rect};

pub use compute::distance::{
    DistanceMetric, DistanceUnit, EARTH_RADIUS_KM, EARTH_RADIUS_MILES, flat_distance,
    spherical_distance,
};
pub use compute::geohash::{GeohashCodec, GeohashKey};
pub use compute::query::{
    GeoMatch, GeoQuery, NearStats, QueryExecutor, QueryResult, QueryStatus,
};
pub use compute::shape::Shape;
pub use compute::spatial::{HaystackIndex, IndexStats, QuadtreeIndex, SpatialIndex};

pub use storage::{DocumentStore, MemoryStore};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Collection, GeoIndexError, Result, SpatialIndexBuilder};

    pub use geo::{Point, Polygon, Rect};

    pub use crate::{CancellationToken, GeoQuery, QueryResult, Shape};

    pub use crate::{DistanceUnit, IndexConfig, IndexKind};

    pub use crate::{DocId, DocumentStore, MemoryStore};
}
