//! Spatial index structures and the shared, lock-guarded index handle.
//!
//! A [`SpatialIndex`] is owned by one collection. Queries take the read lock
//! for their whole traversal; document writes compute every key first and
//! then take the write lock once, so each write is all-or-nothing and
//! linearizable with respect to concurrent queries.

pub mod haystack;
pub mod quadtree;

pub use haystack::{
    BucketEntry, DEFAULT_HAYSTACK_LIMIT, HaystackIndex, HaystackOutcome, HaystackParams,
    PreparedBuckets,
};
pub use quadtree::{PreparedLocations, QuadtreeIndex};

use crate::compute::distance::DistanceMetric;
use crate::config::{CoordinateSource, IndexConfig, IndexKind};
use crate::document::{
    DocId, SecondaryValue, extract_locations, get_path, sample_location,
};
use crate::error::{GeoIndexError, Result};
use geo::Point;
use parking_lot::{RwLock, RwLockReadGuard};
use serde_json::Value;
use std::sync::{Arc, OnceLock};

/// One location of one document in the quadtree-ordered index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub doc_id: DocId,
    /// Position of the location within the document's location list.
    pub slot: u32,
    pub point: Point,
    /// Compound secondary value, when the index has a secondary field.
    pub secondary: Option<SecondaryValue>,
}

/// Parameters of a ranked proximity search.
#[derive(Debug, Clone)]
pub struct NearestParams {
    pub origin: Point,
    pub limit: usize,
    pub max_distance: Option<f64>,
    pub metric: DistanceMetric,
    /// Only entries whose secondary value equals this are considered.
    pub filter: Option<SecondaryValue>,
}

/// A ranked proximity match.
#[derive(Debug, Clone, PartialEq)]
pub struct NearHit {
    pub entry: IndexEntry,
    pub distance: f64,
}

/// Ordered matches of a proximity search plus entries examined.
#[derive(Debug, Clone, Default)]
pub struct NearestOutcome {
    pub hits: Vec<NearHit>,
    pub scanned: usize,
}

/// Backing structure of an index, by kind.
pub enum IndexStorage {
    Flat(QuadtreeIndex),
    Haystack(HaystackIndex),
}

impl IndexStorage {
    pub fn as_flat(&self) -> Result<&QuadtreeIndex> {
        match self {
            IndexStorage::Flat(index) => Ok(index),
            IndexStorage::Haystack(_) => Err(GeoIndexError::InvalidQuery(
                "proximity and region queries require a 2d index, not a haystack index".into(),
            )),
        }
    }

    pub fn as_haystack(&self) -> Result<&HaystackIndex> {
        match self {
            IndexStorage::Haystack(index) => Ok(index),
            IndexStorage::Flat(_) => Err(GeoIndexError::InvalidQuery(
                "haystack search requires a haystack index".into(),
            )),
        }
    }
}

/// Encoded entries of one document write.
#[derive(Debug, Clone)]
pub enum PreparedWrite {
    Flat(PreparedLocations),
    Haystack(PreparedBuckets),
}

impl PreparedWrite {
    pub fn len(&self) -> usize {
        match self {
            PreparedWrite::Flat(p) => p.len(),
            PreparedWrite::Haystack(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Size figures for an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub kind: IndexKind,
    /// Indexed locations.
    pub entries: usize,
    /// Distinct documents with at least one location.
    pub documents: usize,
    /// Populated haystack buckets (zero for 2d indexes).
    pub buckets: usize,
}

/// Cloneable handle to one spatial index.
#[derive(Clone)]
pub struct SpatialIndex {
    config: Arc<IndexConfig>,
    /// Coordinate layout, fixed by configuration or by the first sample.
    source: Arc<OnceLock<CoordinateSource>>,
    inner: Arc<RwLock<IndexStorage>>,
}

impl SpatialIndex {
    /// Creates an empty index after validating `config`.
    pub fn new(config: IndexConfig) -> Result<Self> {
        config.validate()?;

        let storage = match config.kind {
            IndexKind::Flat2d => IndexStorage::Flat(QuadtreeIndex::new(&config)),
            IndexKind::Haystack => IndexStorage::Haystack(HaystackIndex::new(&config)?),
        };

        let source = OnceLock::new();
        if let Some(configured) = &config.coordinate_source {
            let _ = source.set(configured.clone());
        }

        log::debug!(
            "created {:?} index on '{}' (range [{}, {}), {} bits)",
            config.kind,
            config.location_field,
            config.min,
            config.max,
            config.bits
        );

        Ok(Self {
            config: Arc::new(config),
            source: Arc::new(source),
            inner: Arc::new(RwLock::new(storage)),
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn kind(&self) -> IndexKind {
        self.config.kind
    }

    pub fn location_field(&self) -> &str {
        &self.config.location_field
    }

    /// Resolved coordinate layout, if any document has fixed it yet.
    pub fn coordinate_source(&self) -> Option<&CoordinateSource> {
        self.source.get()
    }

    /// Read access to the backing structure for the length of a query.
    pub fn read(&self) -> RwLockReadGuard<'_, IndexStorage> {
        self.inner.read()
    }

    pub fn stats(&self) -> IndexStats {
        let storage = self.inner.read();
        let (entries, documents, buckets) = match &*storage {
            IndexStorage::Flat(index) => (index.len(), index.doc_count(), 0),
            IndexStorage::Haystack(index) => {
                (index.len(), index.doc_count(), index.bucket_count())
            }
        };
        IndexStats {
            kind: self.config.kind,
            entries,
            documents,
            buckets,
        }
    }

    fn resolve_source(&self, doc: &Value) -> Result<Option<CoordinateSource>> {
        if let Some(source) = self.source.get() {
            return Ok(Some(source.clone()));
        }
        let Some(sample) = sample_location(doc, &self.config.location_field) else {
            return Ok(None);
        };
        let inferred = CoordinateSource::infer(sample).ok_or_else(|| {
            GeoIndexError::InvalidInput(format!(
                "cannot infer coordinate layout of '{}' from {}",
                self.config.location_field, sample
            ))
        })?;
        Ok(Some(self.source.get_or_init(|| inferred).clone()))
    }

    /// Extracts and encodes a document's locations without touching the index.
    pub fn prepare(&self, doc: &Value) -> Result<Option<PreparedWrite>> {
        let Some(source) = self.resolve_source(doc)? else {
            return Ok(None);
        };
        let points = extract_locations(doc, &self.config.location_field, &source)?;
        if points.is_empty() {
            return Ok(None);
        }

        let storage = self.inner.read();
        let prepared = match &*storage {
            IndexStorage::Flat(index) => {
                let secondary = self
                    .config
                    .secondary_field
                    .as_deref()
                    .and_then(|field| get_path(doc, field))
                    .map(SecondaryValue::from_value);
                PreparedWrite::Flat(index.prepare(&points, secondary)?)
            }
            IndexStorage::Haystack(index) => {
                let value = self
                    .config
                    .bucket_field
                    .as_deref()
                    .and_then(|field| get_path(doc, field))
                    .map(SecondaryValue::from_value)
                    .unwrap_or_else(|| SecondaryValue::from_value(&Value::Null));
                PreparedWrite::Haystack(index.prepare(&points, value)?)
            }
        };
        Ok(Some(prepared))
    }

    /// Applies prepared entries for a new document.
    pub fn apply_insert(&self, doc_id: DocId, prepared: PreparedWrite) -> Result<()> {
        let mut storage = self.inner.write();
        match (&mut *storage, prepared) {
            (IndexStorage::Flat(index), PreparedWrite::Flat(p)) => index.insert_prepared(doc_id, p),
            (IndexStorage::Haystack(index), PreparedWrite::Haystack(p)) => {
                index.insert_prepared(doc_id, p)
            }
            _ => Err(GeoIndexError::InvalidInput(
                "prepared entries do not match the index kind".into(),
            )),
        }
    }

    /// Atomically swaps a document's entries for `prepared` (or drops them).
    pub fn apply_replace(&self, doc_id: DocId, prepared: Option<PreparedWrite>) -> Result<()> {
        let mut storage = self.inner.write();
        match (&mut *storage, prepared) {
            (IndexStorage::Flat(index), Some(PreparedWrite::Flat(p))) => {
                index.replace_prepared(doc_id, p)?;
            }
            (IndexStorage::Haystack(index), Some(PreparedWrite::Haystack(p))) => {
                index.replace_prepared(doc_id, p)?;
            }
            (IndexStorage::Flat(index), None) => {
                index.remove(&doc_id);
            }
            (IndexStorage::Haystack(index), None) => {
                index.remove(&doc_id);
            }
            _ => {
                return Err(GeoIndexError::InvalidInput(
                    "prepared entries do not match the index kind".into(),
                ));
            }
        }
        Ok(())
    }

    /// Hook for a newly inserted document. Returns the number of locations
    /// indexed; a document without a location is not indexed.
    pub fn on_insert(&self, doc_id: &DocId, doc: &Value) -> Result<usize> {
        let Some(prepared) = self.prepare(doc)? else {
            return Ok(0);
        };
        let count = prepared.len();
        self.apply_insert(doc_id.clone(), prepared)?;
        Ok(count)
    }

    /// Hook for an updated document. Entries are only rewritten when the
    /// location or secondary field changed.
    pub fn on_update(&self, doc_id: &DocId, old_doc: &Value, new_doc: &Value) -> Result<()> {
        if !self.indexed_fields_changed(old_doc, new_doc) {
            return Ok(());
        }
        let prepared = self.prepare(new_doc)?;
        self.apply_replace(doc_id.clone(), prepared)
    }

    /// Hook for a deleted document. Returns the number of locations removed.
    pub fn on_delete(&self, doc_id: &DocId, doc: &Value) -> usize {
        let removed = {
            let mut storage = self.inner.write();
            match &mut *storage {
                IndexStorage::Flat(index) => index.remove(doc_id),
                IndexStorage::Haystack(index) => index.remove(doc_id),
            }
        };
        if removed == 0 && sample_location(doc, &self.config.location_field).is_some() {
            log::warn!(
                "deleted document {} had a location but no index entries",
                doc_id
            );
        }
        removed
    }

    fn indexed_fields_changed(&self, old_doc: &Value, new_doc: &Value) -> bool {
        let fields = [
            Some(self.config.location_field.as_str()),
            self.config.secondary_field.as_deref(),
            self.config.bucket_field.as_deref(),
        ];
        fields
            .into_iter()
            .flatten()
            .any(|field| field_values(old_doc, field) != field_values(new_doc, field))
    }
}

/// Full text of every value under a path, for change detection.
fn field_values(doc: &Value, path: &str) -> String {
    let mut values = Vec::new();
    collect_values(doc, &path.split('.').collect::<Vec<_>>(), &mut values);
    values.join("|")
}

fn collect_values(value: &Value, segments: &[&str], out: &mut Vec<String>) {
    let Some((head, rest)) = segments.split_first() else {
        out.push(value.to_string());
        return;
    };
    match value {
        Value::Object(map) => {
            if let Some(child) = map.get(*head) {
                collect_values(child, rest, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_values(item, segments, out);
            }
        }
        _ => {}
    }
}
