//! Collections: a document store plus its spatial index.
//!
//! A [`Collection`] is the collaborator that owns documents and drives the
//! spatial index write hooks. Document writes are serialised by the store
//! lock; queries only take the index read lock and run fully in parallel.
//!
//! # Examples
//!
//! ```rust
//! use geoindex::{CancellationToken, Collection, GeoQuery, IndexConfig, Point};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let places = Collection::new("places");
//! places.create_spatial_index(IndexConfig::flat("loc"))?;
//!
//! places.insert("nyc", json!({ "loc": [-74.0, 40.74] }))?;
//! places.insert("philly", json!({ "loc": [-75.16, 39.95] }))?;
//!
//! let result = places.find(
//!     &GeoQuery::near("loc", Point::new(-74.0, 40.0)).limit(1),
//!     &CancellationToken::new(),
//! )?;
//! assert_eq!(result.rows.len(), 1);
//! # Ok(())
//! # }
//! ```

mod catalog;

pub use catalog::IndexCatalog;

use crate::cancel::CancellationToken;
use crate::compute::query::{GeoQuery, QueryExecutor, QueryResult};
use crate::compute::spatial::{IndexStats, SpatialIndex};
use crate::config::IndexConfig;
use crate::document::DocId;
use crate::error::{GeoIndexError, Result};
use crate::storage::{DocumentStore, MemoryStore};
use parking_lot::RwLock;
use serde_json::Value;

/// Outcome of a bulk load. A rejected document never aborts the batch.
#[derive(Debug, Default)]
pub struct BulkWriteReport {
    pub inserted: Vec<DocId>,
    pub errors: Vec<(DocId, GeoIndexError)>,
}

impl BulkWriteReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn inserted_count(&self) -> usize {
        self.inserted.len()
    }
}

/// A named set of documents with at most one spatial index.
pub struct Collection {
    name: String,
    store: RwLock<Box<dyn DocumentStore>>,
    catalog: IndexCatalog,
}

impl Collection {
    /// Creates an empty in-memory collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_store(name, Box::new(MemoryStore::new()))
    }

    /// Creates a collection over an existing document store.
    pub fn with_store(name: impl Into<String>, store: Box<dyn DocumentStore>) -> Self {
        Self {
            name: name.into(),
            store: RwLock::new(store),
            catalog: IndexCatalog::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> Result<usize> {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.store.read().is_empty()
    }

    /// The collection's spatial index, if one exists.
    pub fn spatial_index(&self) -> Option<SpatialIndex> {
        self.catalog.get()
    }

    pub fn index_stats(&self) -> Option<IndexStats> {
        self.catalog.get().map(|index| index.stats())
    }

    /// Creates the collection's spatial index and indexes every stored
    /// document. The first document the index rejects aborts creation and
    /// leaves the collection without an index.
    pub fn create_spatial_index(&self, config: IndexConfig) -> Result<SpatialIndex> {
        // Holding the store lock keeps writers out until the backfill is done.
        let store = self.store.write();
        self.catalog.ensure_vacant()?;

        let index = SpatialIndex::new(config)?;
        let mut indexed = 0usize;
        for (id, doc) in store.iter()? {
            if let Err(e) = index.on_insert(&id, &doc) {
                log::warn!(
                    "index build on '{}.{}' failed at document {}: {}",
                    self.name,
                    index.location_field(),
                    id,
                    e
                );
                return Err(e);
            }
            indexed += 1;
        }

        self.catalog.register(index.clone())?;
        log::debug!(
            "built {:?} index on '{}.{}' over {} documents",
            index.kind(),
            self.name,
            index.location_field(),
            indexed
        );
        Ok(index)
    }

    /// Drops the spatial index on `field`.
    pub fn drop_spatial_index(&self, field: &str) -> Result<()> {
        let _store = self.store.write();
        let index = self.catalog.remove(field)?;
        log::debug!(
            "dropped index on '{}.{}' ({} entries)",
            self.name,
            field,
            index.stats().entries
        );
        Ok(())
    }

    pub fn get(&self, id: &DocId) -> Result<Option<Value>> {
        self.store.read().get(id)
    }

    /// Inserts a new document.
    pub fn insert(&self, id: impl Into<DocId>, doc: Value) -> Result<()> {
        let mut store = self.store.write();
        self.insert_locked(&mut **store, id.into(), doc)
    }

    fn insert_locked(&self, store: &mut dyn DocumentStore, id: DocId, doc: Value) -> Result<()> {
        if store.contains(&id)? {
            return Err(GeoIndexError::DuplicateDocument(id));
        }

        let index = self.catalog.get();
        if let Some(index) = &index
            && let Err(e) = index.on_insert(&id, &doc)
        {
            log::warn!("rejected insert of {} into '{}': {}", id, self.name, e);
            return Err(e);
        }

        if let Err(e) = store.put(id.clone(), doc.clone()) {
            if let Some(index) = &index {
                index.on_delete(&id, &doc);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Inserts every document, collecting per-document failures.
    pub fn insert_many<I, K>(&self, docs: I) -> BulkWriteReport
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<DocId>,
    {
        let mut report = BulkWriteReport::default();
        let mut store = self.store.write();
        for (id, doc) in docs {
            let id = id.into();
            match self.insert_locked(&mut **store, id.clone(), doc) {
                Ok(()) => report.inserted.push(id),
                Err(e) => report.errors.push((id, e)),
            }
        }
        if !report.is_ok() {
            log::warn!(
                "bulk insert into '{}': {} inserted, {} skipped",
                self.name,
                report.inserted.len(),
                report.errors.len()
            );
        }
        report
    }

    /// Replaces an existing document. Returns the previous version.
    pub fn update(&self, id: &DocId, doc: Value) -> Result<Value> {
        let mut store = self.store.write();
        let old = store
            .get(id)?
            .ok_or_else(|| GeoIndexError::DocumentNotFound(id.clone()))?;

        let index = self.catalog.get();
        if let Some(index) = &index
            && let Err(e) = index.on_update(id, &old, &doc)
        {
            log::warn!("rejected update of {} in '{}': {}", id, self.name, e);
            return Err(e);
        }

        if let Err(e) = store.put(id.clone(), doc.clone()) {
            if let Some(index) = &index
                && let Err(restore) = index.on_update(id, &doc, &old)
            {
                log::warn!(
                    "could not restore index entries of {} in '{}': {}",
                    id,
                    self.name,
                    restore
                );
            }
            return Err(e);
        }
        Ok(old)
    }

    /// Deletes a document and all of its index entries.
    pub fn delete(&self, id: &DocId) -> Result<Value> {
        let mut store = self.store.write();
        let doc = store
            .delete(id)?
            .ok_or_else(|| GeoIndexError::DocumentNotFound(id.clone()))?;
        if let Some(index) = self.catalog.get() {
            index.on_delete(id, &doc);
        }
        Ok(doc)
    }

    /// Runs a geospatial query against the index on the query's field.
    pub fn find(&self, query: &GeoQuery, cancel: &CancellationToken) -> Result<QueryResult> {
        let index = self.catalog.get_for(query.field())?;
        QueryExecutor::new(&index).execute(query, cancel)
    }
}
