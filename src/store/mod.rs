//! Tile stores
//!
//! A store holds named collections ("stacks") of sections. Each section is
//! the tile set of one z coordinate together with its shared transforms.
//!
//! - [`MemoryStore`] - In-process store, mainly for tests and embedding
//! - [`FileStore`] - One JSON file per section under a root directory

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::models::ResolvedTiles;
use thiserror::Error;

/// Errors raised by tile store operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Section could not be read
    #[error("failed to fetch section z={z} of '{collection}': {message}")]
    Fetch { collection: String, z: f64, message: String },

    /// Section could not be written
    #[error("failed to write section z={z} of '{collection}': {message}")]
    Write { collection: String, z: f64, message: String },

    /// Collection does not exist
    #[error("collection '{0}' not found")]
    CollectionNotFound(String),

    /// Underlying I/O failure
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Section document is not valid JSON
    #[error("invalid section document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Backing repository of tiles and shared transforms.
///
/// Stores are shared across section workers, so implementations serialize
/// their own writes.
pub trait TileStore: Send + Sync {
    /// Section z coordinates of `collection`, ascending.
    fn list_sections(&self, collection: &str) -> Result<Vec<f64>, StoreError>;

    /// Tiles and shared transforms of one section.
    fn fetch_section(&self, collection: &str, z: f64) -> Result<ResolvedTiles, StoreError>;

    /// Replace one section with `tiles`.
    fn write_section(
        &self,
        collection: &str,
        z: f64,
        tiles: &ResolvedTiles,
    ) -> Result<(), StoreError>;

    /// Create `collection` if it does not exist yet.
    fn ensure_collection(&self, collection: &str) -> Result<(), StoreError>;
}

impl<S: TileStore + ?Sized> TileStore for &S {
    fn list_sections(&self, collection: &str) -> Result<Vec<f64>, StoreError> {
        (**self).list_sections(collection)
    }

    fn fetch_section(&self, collection: &str, z: f64) -> Result<ResolvedTiles, StoreError> {
        (**self).fetch_section(collection, z)
    }

    fn write_section(
        &self,
        collection: &str,
        z: f64,
        tiles: &ResolvedTiles,
    ) -> Result<(), StoreError> {
        (**self).write_section(collection, z, tiles)
    }

    fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        (**self).ensure_collection(collection)
    }
}
