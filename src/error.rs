//! Error types for the geospatial index.

use crate::document::DocId;
use thiserror::Error;

/// Errors reported by index creation, document writes and queries.
///
/// Every error is reported synchronously to the caller of the operation that
/// triggered it. Nothing is retried internally.
#[derive(Debug, Error)]
pub enum GeoIndexError {
    /// Bad bits, range, bucket size or field names at index creation.
    #[error("invalid index configuration: {0}")]
    Config(String),

    /// A coordinate falls outside the configured `[min, max)` range.
    #[error("point ({x}, {y}) not in interval [{min}, {max})")]
    Range { x: f64, y: f64, min: f64, max: f64 },

    /// A spherical operation was given a latitude outside `[-90, 90]`.
    #[error("latitude {0} outside [-90, 90] for spherical operation")]
    LatitudeRange(f64),

    /// The query region crosses the range discontinuity or a pole.
    #[error("query region wraps around: {0}")]
    Wraparound(String),

    /// Cooperative cancellation was observed mid-scan.
    #[error("query cancelled")]
    Cancelled,

    /// Malformed coordinate or document shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The query is not supported by the index it targets.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// No spatial index exists on the queried field.
    #[error("no spatial index on field '{0}'")]
    NoIndex(String),

    /// The collection already owns a spatial index.
    #[error("collection already has a spatial index on '{0}'")]
    IndexExists(String),

    #[error("document not found: {0}")]
    DocumentNotFound(DocId),

    #[error("duplicate document id: {0}")]
    DuplicateDocument(DocId),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GeoIndexError {
    /// Returns true for errors that reject a single document write but
    /// leave a surrounding bulk load free to continue.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            GeoIndexError::Range { .. }
                | GeoIndexError::LatitudeRange(_)
                | GeoIndexError::InvalidInput(_)
                | GeoIndexError::DuplicateDocument(_)
        )
    }
}

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, GeoIndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_error_message() {
        let err = GeoIndexError::Range {
            x: 200.0,
            y: 10.0,
            min: -180.0,
            max: 180.0,
        };
        assert_eq!(err.to_string(), "point (200, 10) not in interval [-180, 180)");
        assert!(err.is_document_error());
    }

    #[test]
    fn test_query_errors_are_not_document_errors() {
        assert!(!GeoIndexError::Cancelled.is_document_error());
        assert!(!GeoIndexError::Wraparound("antimeridian".into()).is_document_error());
        assert!(!GeoIndexError::Config("bits".into()).is_document_error());
    }
}
