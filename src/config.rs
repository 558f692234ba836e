//! Index configuration.
//!
//! `IndexConfig` is immutable once an index is created. It is serializable so
//! it can be loaded from JSON or TOML, and every loader runs `validate()`.
//!
//! # Example
//!
//! ```rust
//! use geoindex::{IndexConfig, IndexKind};
//!
//! let json = r#"{
//!     "location_field": "pos",
//!     "kind": "haystack",
//!     "bucket_field": "type",
//!     "bucket_size": 1.0
//! }"#;
//! let config = IndexConfig::from_json(json).unwrap();
//! assert_eq!(config.kind, IndexKind::Haystack);
//! assert_eq!(config.bits, 26);
//! ```

use crate::error::{GeoIndexError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default lower bound of the coordinate range.
pub const DEFAULT_MIN: f64 = -180.0;
/// Default (exclusive) upper bound of the coordinate range.
pub const DEFAULT_MAX: f64 = 180.0;
/// Default geohash precision per axis.
pub const DEFAULT_BITS: u8 = 26;
/// Maximum geohash precision per axis.
pub const MAX_BITS: u8 = 32;

/// Kind of spatial index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Geohash-ordered index supporting proximity and region queries.
    #[default]
    Flat2d,
    /// Bucketed index for locality + secondary attribute search.
    Haystack,
}

/// How a coordinate is laid out inside a document.
///
/// Resolved once per index, never per document on the write path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "layout")]
pub enum CoordinateSource {
    /// `[x, y]`
    #[default]
    ArrayPair,
    /// `{ <x_key>: x, <y_key>: y }`
    ObjectFields { x_key: String, y_key: String },
}

impl CoordinateSource {
    /// Infers the layout from a sample location value.
    ///
    /// Objects use their first two keys in document order. A list of
    /// locations is resolved from its first element.
    pub fn infer(sample: &Value) -> Option<Self> {
        match sample {
            Value::Array(items) => match items.first() {
                Some(Value::Number(_)) => Some(CoordinateSource::ArrayPair),
                Some(first @ (Value::Array(_) | Value::Object(_))) => Self::infer(first),
                _ => None,
            },
            Value::Object(map) => {
                let mut keys = map.keys();
                let x_key = keys.next()?.clone();
                let y_key = keys.next()?.clone();
                Some(CoordinateSource::ObjectFields { x_key, y_key })
            }
            _ => None,
        }
    }
}

/// Immutable configuration for one spatial index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Dotted path of the location field.
    pub location_field: String,

    #[serde(default)]
    pub kind: IndexKind,

    /// Inclusive lower bound of both axes.
    #[serde(default = "IndexConfig::default_min")]
    pub min: f64,

    /// Exclusive upper bound of both axes.
    #[serde(default = "IndexConfig::default_max")]
    pub max: f64,

    /// Geohash precision per axis (1-32).
    #[serde(default = "IndexConfig::default_bits")]
    pub bits: u8,

    /// Secondary field stored alongside each Flat2D entry (compound index).
    #[serde(default)]
    pub secondary_field: Option<String>,

    /// Secondary attribute partitioning haystack buckets.
    #[serde(default)]
    pub bucket_field: Option<String>,

    /// Edge length of a haystack bucket, in coordinate units.
    #[serde(default)]
    pub bucket_size: Option<f64>,

    /// Distance from a bucket edge within which an entry is replicated into
    /// the neighbouring bucket. Zero replicates only points lying exactly on
    /// an edge.
    #[serde(default)]
    pub bucket_overlap: f64,

    /// Coordinate layout. `None` is inferred from the first document seen.
    #[serde(default)]
    pub coordinate_source: Option<CoordinateSource>,
}

impl IndexConfig {
    const fn default_min() -> f64 {
        DEFAULT_MIN
    }

    const fn default_max() -> f64 {
        DEFAULT_MAX
    }

    const fn default_bits() -> u8 {
        DEFAULT_BITS
    }

    /// Flat2D config over the default range and precision.
    pub fn flat(location_field: impl Into<String>) -> Self {
        Self {
            location_field: location_field.into(),
            kind: IndexKind::Flat2d,
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
            bits: DEFAULT_BITS,
            secondary_field: None,
            bucket_field: None,
            bucket_size: None,
            bucket_overlap: 0.0,
            coordinate_source: None,
        }
    }

    /// Haystack config bucketing by `bucket_field` in cells of `bucket_size`.
    pub fn haystack(
        location_field: impl Into<String>,
        bucket_field: impl Into<String>,
        bucket_size: f64,
    ) -> Self {
        Self {
            kind: IndexKind::Haystack,
            bucket_field: Some(bucket_field.into()),
            bucket_size: Some(bucket_size),
            ..Self::flat(location_field)
        }
    }

    /// Width of the configured range.
    pub fn extent(&self) -> f64 {
        self.max - self.min
    }

    /// Edge length of the smallest geohash cell.
    pub fn cell_edge(&self) -> f64 {
        self.extent() / (1u64 << self.bits) as f64
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.location_field.is_empty() || self.location_field.split('.').any(str::is_empty) {
            return Err(GeoIndexError::Config(format!(
                "invalid location field path '{}'",
                self.location_field
            )));
        }

        if self.bits < 1 || self.bits > MAX_BITS {
            return Err(GeoIndexError::Config(format!(
                "bits must be in [1, {}], got {}",
                MAX_BITS, self.bits
            )));
        }

        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(GeoIndexError::Config("range bounds must be finite".into()));
        }

        if self.min >= self.max {
            return Err(GeoIndexError::Config(format!(
                "range min ({}) must be less than max ({})",
                self.min, self.max
            )));
        }

        if !self.bucket_overlap.is_finite() || self.bucket_overlap < 0.0 {
            return Err(GeoIndexError::Config(
                "bucket overlap must be a non-negative finite number".into(),
            ));
        }

        match self.kind {
            IndexKind::Flat2d => {
                if self.bucket_size.is_some() || self.bucket_field.is_some() {
                    return Err(GeoIndexError::Config(
                        "bucket options only apply to haystack indexes".into(),
                    ));
                }
            }
            IndexKind::Haystack => {
                let Some(size) = self.bucket_size else {
                    return Err(GeoIndexError::Config(
                        "haystack index requires bucket_size".into(),
                    ));
                };
                if !size.is_finite() || size <= 0.0 {
                    return Err(GeoIndexError::Config(format!(
                        "bucket_size must be positive, got {}",
                        size
                    )));
                }
                if self.bucket_field.as_deref().is_none_or(str::is_empty) {
                    return Err(GeoIndexError::Config(
                        "haystack index requires bucket_field".into(),
                    ));
                }
                if self.bucket_overlap >= size {
                    return Err(GeoIndexError::Config(format!(
                        "bucket overlap ({}) must be smaller than bucket_size ({})",
                        self.bucket_overlap, size
                    )));
                }
                if self.secondary_field.is_some() {
                    return Err(GeoIndexError::Config(
                        "haystack indexes use bucket_field, not secondary_field".into(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: IndexConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: IndexConfig =
            toml::from_str(toml_str).map_err(|e| GeoIndexError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GeoIndexError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = IndexConfig::flat("loc");
        assert!(config.validate().is_ok());
        assert_eq!(config.bits, 26);
        assert_eq!(config.min, -180.0);
        assert_eq!(config.max, 180.0);
        // ~2 ft at the equator
        assert!((config.cell_edge() - 5.364e-6).abs() < 1e-8);
    }

    #[test]
    fn test_bits_bounds() {
        let mut config = IndexConfig::flat("loc");
        config.bits = 0;
        assert!(matches!(config.validate(), Err(GeoIndexError::Config(_))));
        config.bits = 33;
        assert!(config.validate().is_err());
        config.bits = 32;
        assert!(config.validate().is_ok());
        config.bits = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_range() {
        let mut config = IndexConfig::flat("loc");
        config.min = 10.0;
        config.max = 10.0;
        assert!(config.validate().is_err());
        config.max = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_haystack_requires_bucket_options() {
        assert!(IndexConfig::haystack("pos", "type", 1.0).validate().is_ok());
        assert!(IndexConfig::haystack("pos", "type", 0.0).validate().is_err());
        assert!(IndexConfig::haystack("pos", "type", -2.0).validate().is_err());
        assert!(IndexConfig::haystack("pos", "", 1.0).validate().is_err());

        let mut config = IndexConfig::haystack("pos", "type", 1.0);
        config.bucket_size = None;
        assert!(config.validate().is_err());

        let mut config = IndexConfig::haystack("pos", "type", 1.0);
        config.bucket_overlap = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_flat_rejects_bucket_options() {
        let mut config = IndexConfig::flat("loc");
        config.bucket_size = Some(1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_keeps_values() {
        let mut config = IndexConfig::flat("places.loc");
        config.bits = 20;
        config.secondary_field = Some("type".into());
        let json = config.to_json().unwrap();
        assert_eq!(IndexConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_json_validation_runs_on_load() {
        let json = r#"{ "location_field": "loc", "bits": 40 }"#;
        assert!(matches!(
            IndexConfig::from_json(json),
            Err(GeoIndexError::Config(_))
        ));
    }

    #[test]
    fn test_infer_coordinate_source() {
        assert_eq!(
            CoordinateSource::infer(&json!([1.0, 2.0])),
            Some(CoordinateSource::ArrayPair)
        );
        assert_eq!(
            CoordinateSource::infer(&json!([[1.0, 2.0], [3.0, 4.0]])),
            Some(CoordinateSource::ArrayPair)
        );
        assert_eq!(
            CoordinateSource::infer(&json!({ "lng": 1.0, "lat": 2.0 })),
            Some(CoordinateSource::ObjectFields {
                x_key: "lng".into(),
                y_key: "lat".into()
            })
        );
        assert_eq!(CoordinateSource::infer(&json!("nope")), None);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_load() {
        let toml_str = r#"
            location_field = "pos"
            kind = "haystack"
            bucket_field = "type"
            bucket_size = 2.5
        "#;
        let config = IndexConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.bucket_size, Some(2.5));
    }
}
