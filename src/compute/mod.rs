//! Compute layer: key derivation, distance evaluation, index structures and
//! query execution.
//!
//! Nothing in here touches the document store; the `db` layer feeds documents
//! in through the spatial index write hooks.

pub mod distance;
pub mod geohash;
pub mod query;
pub mod shape;
pub mod spatial;
pub mod validation;
