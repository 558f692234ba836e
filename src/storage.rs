//! Document store abstraction.
//!
//! The spatial index never owns documents; a collection keeps them in a
//! [`DocumentStore`] and feeds every write through the index hooks. The trait
//! keeps the collection independent of where documents actually live.

use crate::document::DocId;
use crate::error::Result;
use serde_json::Value;
use std::collections::BTreeMap;

/// Trait for document store implementations
pub trait DocumentStore: Send + Sync {
    /// Insert or replace a document, returning the previous version
    fn put(&mut self, id: DocId, doc: Value) -> Result<Option<Value>>;

    /// Get a document by id
    fn get(&self, id: &DocId) -> Result<Option<Value>>;

    /// Delete a document and return it if it existed
    fn delete(&mut self, id: &DocId) -> Result<Option<Value>>;

    fn contains(&self, id: &DocId) -> Result<bool>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool>;

    /// Iterator over all documents in id order
    fn iter(&self) -> Result<Box<dyn Iterator<Item = (DocId, Value)> + '_>>;
}

/// In-memory document store using BTreeMap
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: BTreeMap<DocId, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn put(&mut self, id: DocId, doc: Value) -> Result<Option<Value>> {
        Ok(self.docs.insert(id, doc))
    }

    fn get(&self, id: &DocId) -> Result<Option<Value>> {
        Ok(self.docs.get(id).cloned())
    }

    fn delete(&mut self, id: &DocId) -> Result<Option<Value>> {
        Ok(self.docs.remove(id))
    }

    fn contains(&self, id: &DocId) -> Result<bool> {
        Ok(self.docs.contains_key(id))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.docs.len())
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.docs.is_empty())
    }

    fn iter(&self) -> Result<Box<dyn Iterator<Item = (DocId, Value)> + '_>> {
        Ok(Box::new(
            self.docs.iter().map(|(id, doc)| (id.clone(), doc.clone())),
        ))
    }
}
