//! Per-collection registry of the spatial index.

use crate::compute::spatial::SpatialIndex;
use crate::error::{GeoIndexError, Result};
use parking_lot::RwLock;

/// Holds at most one spatial index for its collection.
///
/// The index itself knows nothing about siblings; the one-index rule is
/// enforced here at registration time.
#[derive(Default)]
pub struct IndexCatalog {
    slot: RwLock<Option<SpatialIndex>>,
}

impl IndexCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `index`, failing with `IndexExists` if the slot is taken.
    pub fn register(&self, index: SpatialIndex) -> Result<()> {
        let mut slot = self.slot.write();
        if let Some(existing) = slot.as_ref() {
            return Err(GeoIndexError::IndexExists(
                existing.location_field().to_string(),
            ));
        }
        *slot = Some(index);
        Ok(())
    }

    /// Fails with `IndexExists` if an index is already registered.
    pub fn ensure_vacant(&self) -> Result<()> {
        match self.slot.read().as_ref() {
            Some(existing) => Err(GeoIndexError::IndexExists(
                existing.location_field().to_string(),
            )),
            None => Ok(()),
        }
    }

    pub fn get(&self) -> Option<SpatialIndex> {
        self.slot.read().clone()
    }

    /// Index on `field`, or `NoIndex`.
    pub fn get_for(&self, field: &str) -> Result<SpatialIndex> {
        self.slot
            .read()
            .as_ref()
            .filter(|index| index.location_field() == field)
            .cloned()
            .ok_or_else(|| GeoIndexError::NoIndex(field.to_string()))
    }

    /// Removes the index on `field`.
    pub fn remove(&self, field: &str) -> Result<SpatialIndex> {
        let mut slot = self.slot.write();
        match slot.as_ref() {
            Some(index) if index.location_field() == field => {
                slot.take().ok_or_else(|| GeoIndexError::NoIndex(field.to_string()))
            }
            _ => Err(GeoIndexError::NoIndex(field.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slot.read().is_none()
    }
}
