//! Query execution over a spatial index.
//!
//! [`QueryExecutor`] dispatches a [`GeoQuery`] to the structure backing the
//! index, ranks or filters the matches and shapes the result rows. Every
//! query holds the index read lock for its whole traversal.
//!
//! # Examples
//!
//! ```rust
//! use geoindex::{CancellationToken, DocId, GeoQuery, IndexConfig, Point, QueryExecutor, SpatialIndex};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let index = SpatialIndex::new(IndexConfig::flat("loc"))?;
//! index.on_insert(&DocId::from("a"), &json!({ "loc": [-74.0, 40.74] }))?;
//! index.on_insert(&DocId::from("b"), &json!({ "loc": [-73.0, 40.0] }))?;
//!
//! let query = GeoQuery::near_sphere("loc", Point::new(-74.0, 40.74)).limit(2);
//! let result = QueryExecutor::new(&index).execute(&query, &CancellationToken::new())?;
//! assert_eq!(result.rows[1].doc_id, DocId::from("b"));
//! # Ok(())
//! # }
//! ```

use crate::cancel::CancellationToken;
use crate::compute::distance::{DistanceMetric, DistanceUnit};
use crate::compute::shape::{Shape, check_spherical_cap};
use crate::compute::spatial::{
    DEFAULT_HAYSTACK_LIMIT, HaystackParams, NearestParams, SpatialIndex,
};
use crate::compute::validation::{validate_distance, validate_finite, validate_spherical_point};
use crate::document::{DocId, SecondaryValue};
use crate::error::{GeoIndexError, Result};
use geo::Point;
use rustc_hash::FxHashSet;

/// Result limit of `Near` / `NearSphere` when none is given.
pub const DEFAULT_NEAR_LIMIT: usize = 100;

/// Proximity request shared by `Near` and `NearSphere`.
#[derive(Debug, Clone)]
pub struct NearQuery {
    pub field: String,
    pub origin: Point,
    pub limit: Option<usize>,
    /// Upper bound on distance, in coordinate units (flat) or radians (spherical).
    pub max_distance: Option<f64>,
    /// Scales reported distances. Applied after `max_distance` filtering.
    pub distance_multiplier: Option<f64>,
    pub include_locs: bool,
    /// Secondary value required on matched entries.
    pub filter: Option<SecondaryValue>,
    /// Report only the closest location of each document.
    pub unique_docs: bool,
}

impl NearQuery {
    pub fn new(field: impl Into<String>, origin: Point) -> Self {
        Self {
            field: field.into(),
            origin,
            limit: None,
            max_distance: None,
            distance_multiplier: None,
            include_locs: false,
            filter: None,
            unique_docs: false,
        }
    }

    fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_NEAR_LIMIT)
    }
}

/// Region containment request.
#[derive(Debug, Clone)]
pub struct WithinQuery {
    pub field: String,
    pub shape: Shape,
    pub filter: Option<SecondaryValue>,
    pub unique_docs: bool,
}

/// Locality plus secondary value request against a haystack index.
#[derive(Debug, Clone)]
pub struct HaystackQuery {
    pub field: String,
    pub origin: Point,
    pub secondary_value: SecondaryValue,
    pub max_distance: f64,
    pub limit: usize,
    /// Haystack indexes only support flat distance; setting this is an error.
    pub spherical: bool,
}

/// A geospatial query request.
#[derive(Debug, Clone)]
pub enum GeoQuery {
    Near(NearQuery),
    NearSphere(NearQuery),
    Within(WithinQuery),
    HaystackSearch(HaystackQuery),
}

impl GeoQuery {
    pub fn near(field: impl Into<String>, origin: Point) -> Self {
        GeoQuery::Near(NearQuery::new(field, origin))
    }

    pub fn near_sphere(field: impl Into<String>, origin: Point) -> Self {
        GeoQuery::NearSphere(NearQuery::new(field, origin))
    }

    pub fn within(field: impl Into<String>, shape: Shape) -> Self {
        GeoQuery::Within(WithinQuery {
            field: field.into(),
            shape,
            filter: None,
            unique_docs: false,
        })
    }

    pub fn haystack(
        field: impl Into<String>,
        origin: Point,
        secondary_value: impl Into<SecondaryValue>,
        max_distance: f64,
    ) -> Self {
        GeoQuery::HaystackSearch(HaystackQuery {
            field: field.into(),
            origin,
            secondary_value: secondary_value.into(),
            max_distance,
            limit: DEFAULT_HAYSTACK_LIMIT,
            spherical: false,
        })
    }

    /// Field the query targets.
    pub fn field(&self) -> &str {
        match self {
            GeoQuery::Near(q) | GeoQuery::NearSphere(q) => &q.field,
            GeoQuery::Within(q) => &q.field,
            GeoQuery::HaystackSearch(q) => &q.field,
        }
    }

    fn near_mut(&mut self) -> Option<&mut NearQuery> {
        match self {
            GeoQuery::Near(q) | GeoQuery::NearSphere(q) => Some(q),
            _ => None,
        }
    }

    /// Maximum rows (`Near`, `NearSphere`, `HaystackSearch`).
    pub fn limit(mut self, limit: usize) -> Self {
        match &mut self {
            GeoQuery::Near(q) | GeoQuery::NearSphere(q) => q.limit = Some(limit),
            GeoQuery::HaystackSearch(q) => q.limit = limit,
            GeoQuery::Within(_) => {}
        }
        self
    }

    pub fn max_distance(mut self, max_distance: f64) -> Self {
        if let Some(q) = self.near_mut() {
            q.max_distance = Some(max_distance);
        }
        self
    }

    pub fn distance_multiplier(mut self, multiplier: f64) -> Self {
        if let Some(q) = self.near_mut() {
            q.distance_multiplier = Some(multiplier);
        }
        self
    }

    /// Reports spherical distances in `unit` instead of radians.
    pub fn in_unit(self, unit: DistanceUnit) -> Self {
        self.distance_multiplier(unit.earth_radius())
    }

    pub fn include_locs(mut self, include: bool) -> Self {
        if let Some(q) = self.near_mut() {
            q.include_locs = include;
        }
        self
    }

    /// Restricts matches to entries whose secondary value equals `value`.
    pub fn filter(mut self, value: impl Into<SecondaryValue>) -> Self {
        let value = value.into();
        match &mut self {
            GeoQuery::Near(q) | GeoQuery::NearSphere(q) => q.filter = Some(value),
            GeoQuery::Within(q) => q.filter = Some(value),
            GeoQuery::HaystackSearch(q) => q.secondary_value = value,
        }
        self
    }

    pub fn unique_docs(mut self, unique: bool) -> Self {
        match &mut self {
            GeoQuery::Near(q) | GeoQuery::NearSphere(q) => q.unique_docs = unique,
            GeoQuery::Within(q) => q.unique_docs = unique,
            GeoQuery::HaystackSearch(_) => {}
        }
        self
    }

    pub fn spherical(mut self, spherical: bool) -> Self {
        if let GeoQuery::HaystackSearch(q) = &mut self {
            q.spherical = spherical;
        }
        self
    }
}

/// One result row.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoMatch {
    pub doc_id: DocId,
    /// Matched location, when requested.
    pub location: Option<Point>,
    /// Reported distance, for proximity queries.
    pub distance: Option<f64>,
}

/// Aggregate figures of a proximity query.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NearStats {
    /// Index entries examined.
    pub n_scanned: usize,
    pub average_distance: f64,
    pub max_distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
    #[default]
    Complete,
    /// Cancellation was observed; no rows are reported.
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub rows: Vec<GeoMatch>,
    pub stats: Option<NearStats>,
    pub status: QueryStatus,
}

impl QueryResult {
    fn cancelled() -> Self {
        Self {
            rows: Vec::new(),
            stats: None,
            status: QueryStatus::Cancelled,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == QueryStatus::Cancelled
    }

    /// Document ids in row order.
    pub fn doc_ids(&self) -> Vec<DocId> {
        self.rows.iter().map(|row| row.doc_id.clone()).collect()
    }
}

/// Runs queries against one spatial index.
pub struct QueryExecutor<'a> {
    index: &'a SpatialIndex,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(index: &'a SpatialIndex) -> Self {
        Self { index }
    }

    /// Executes `query`. Cancellation is reported through
    /// [`QueryStatus::Cancelled`], never as an error.
    pub fn execute(&self, query: &GeoQuery, cancel: &CancellationToken) -> Result<QueryResult> {
        if query.field() != self.index.location_field() {
            return Err(GeoIndexError::NoIndex(query.field().to_string()));
        }

        let outcome = match query {
            GeoQuery::Near(q) => self.near(q, DistanceMetric::Flat, cancel),
            GeoQuery::NearSphere(q) => self.near(q, DistanceMetric::Spherical, cancel),
            GeoQuery::Within(q) => self.within(q, cancel),
            GeoQuery::HaystackSearch(q) => self.haystack(q, cancel),
        };

        match outcome {
            Err(GeoIndexError::Cancelled) => {
                log::debug!("query on '{}' cancelled", query.field());
                Ok(QueryResult::cancelled())
            }
            other => other,
        }
    }

    fn near(
        &self,
        query: &NearQuery,
        metric: DistanceMetric,
        cancel: &CancellationToken,
    ) -> Result<QueryResult> {
        match metric {
            DistanceMetric::Flat => validate_finite(&query.origin)?,
            DistanceMetric::Spherical => validate_spherical_point(&query.origin)?,
        }
        if let Some(max_distance) = query.max_distance {
            validate_distance(max_distance, "maxDistance")?;
            if metric.is_spherical() {
                check_spherical_cap(&query.origin, max_distance)?;
            }
        }
        let multiplier = query.distance_multiplier.unwrap_or(1.0);
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(GeoIndexError::InvalidQuery(format!(
                "distanceMultiplier must be a non-negative number, got {}",
                multiplier
            )));
        }

        let storage = self.index.read();
        let index = storage.as_flat()?;
        let limit = query.effective_limit();

        let mut params = NearestParams {
            origin: query.origin,
            limit,
            max_distance: query.max_distance,
            metric,
            filter: query.filter.clone(),
        };

        // Closest location per document: widen the candidate window until
        // enough distinct documents are found or the index is exhausted.
        let (hits, scanned) = loop {
            let outcome = index.nearest_with(&params, cancel)?;
            if !query.unique_docs {
                break (outcome.hits, outcome.scanned);
            }
            let exhausted = outcome.hits.len() < params.limit;
            let mut seen = FxHashSet::default();
            let unique: Vec<_> = outcome
                .hits
                .into_iter()
                .filter(|hit| seen.insert(hit.entry.doc_id.clone()))
                .collect();
            if exhausted || unique.len() >= limit {
                break (unique.into_iter().take(limit).collect(), outcome.scanned);
            }
            params.limit = params.limit.saturating_mul(2);
        };

        let rows: Vec<GeoMatch> = hits
            .into_iter()
            .map(|hit| GeoMatch {
                location: query.include_locs.then_some(hit.entry.point),
                distance: Some(hit.distance * multiplier),
                doc_id: hit.entry.doc_id,
            })
            .collect();

        let stats = near_stats(&rows, scanned);
        log::trace!(
            "near{} from ({}, {}): {} rows, {} scanned",
            if metric.is_spherical() { "Sphere" } else { "" },
            query.origin.x(),
            query.origin.y(),
            rows.len(),
            scanned
        );

        Ok(QueryResult {
            rows,
            stats: Some(stats),
            status: QueryStatus::Complete,
        })
    }

    fn within(&self, query: &WithinQuery, cancel: &CancellationToken) -> Result<QueryResult> {
        query.shape.validate()?;
        let Some(rect) = query.shape.bounding_rect() else {
            return Ok(QueryResult::default());
        };

        let storage = self.index.read();
        let index = storage.as_flat()?;
        if query.shape.metric().is_spherical() {
            index.check_spherical()?;
        }

        let mut rows = Vec::new();
        let mut seen: FxHashSet<DocId> = FxHashSet::default();
        index.scan_region(&rect, cancel, |entry| {
            if let Some(filter) = &query.filter
                && entry.secondary.as_ref() != Some(filter)
            {
                return;
            }
            if !query.shape.contains(&entry.point) {
                return;
            }
            if query.unique_docs && !seen.insert(entry.doc_id.clone()) {
                return;
            }
            rows.push(GeoMatch {
                doc_id: entry.doc_id.clone(),
                location: Some(entry.point),
                distance: None,
            });
        })?;

        Ok(QueryResult {
            rows,
            stats: None,
            status: QueryStatus::Complete,
        })
    }

    fn haystack(&self, query: &HaystackQuery, cancel: &CancellationToken) -> Result<QueryResult> {
        if query.spherical {
            return Err(GeoIndexError::Config(
                "haystack indexes do not support spherical search".into(),
            ));
        }

        let storage = self.index.read();
        let index = storage.as_haystack()?;

        let params = HaystackParams {
            origin: query.origin,
            value: query.secondary_value.clone(),
            max_distance: query.max_distance,
            limit: query.limit,
        };
        let outcome = index.search_with(&params, cancel)?;

        let rows = outcome
            .hits
            .into_iter()
            .map(|entry| GeoMatch {
                doc_id: entry.doc_id,
                location: Some(entry.point),
                distance: None,
            })
            .collect();

        Ok(QueryResult {
            rows,
            stats: None,
            status: QueryStatus::Complete,
        })
    }
}

fn near_stats(rows: &[GeoMatch], scanned: usize) -> NearStats {
    let distances: Vec<f64> = rows.iter().filter_map(|row| row.distance).collect();
    if distances.is_empty() {
        return NearStats {
            n_scanned: scanned,
            ..NearStats::default()
        };
    }
    NearStats {
        n_scanned: scanned,
        average_distance: distances.iter().sum::<f64>() / distances.len() as f64,
        max_distance: distances.iter().copied().fold(0.0, f64::max),
    }
}
