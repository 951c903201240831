//! In-memory tile store.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::{StoreError, TileStore};
use crate::models::ResolvedTiles;

#[derive(Debug, Default)]
struct Inner {
    /// Sections per collection, kept sorted by z.
    collections: HashMap<String, Vec<(f64, ResolvedTiles)>>,
    failing_fetches: HashSet<(String, u64)>,
    failing_writes: HashSet<(String, u64)>,
    writes: usize,
}

/// Tile store held entirely in memory.
///
/// Individual sections can be told to fail on fetch or write, which lets
/// callers exercise partial-failure paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking writer cannot leave a half-written section behind.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store a section, creating its collection if needed.
    pub fn insert_section(&self, collection: &str, z: f64, tiles: ResolvedTiles) {
        let mut inner = self.lock();
        let sections = inner.collections.entry(collection.to_string()).or_default();
        upsert(sections, z, tiles);
    }

    /// Builder form of [`insert_section`](Self::insert_section).
    pub fn with_section(self, collection: &str, z: f64, tiles: ResolvedTiles) -> Self {
        self.insert_section(collection, z, tiles);
        self
    }

    /// Make every fetch of this section fail.
    pub fn fail_fetch(&self, collection: &str, z: f64) {
        self.lock().failing_fetches.insert((collection.to_string(), z.to_bits()));
    }

    /// Make every write of this section fail.
    pub fn fail_write(&self, collection: &str, z: f64) {
        self.lock().failing_writes.insert((collection.to_string(), z.to_bits()));
    }

    /// Copy of a stored section.
    pub fn section(&self, collection: &str, z: f64) -> Option<ResolvedTiles> {
        self.lock()
            .collections
            .get(collection)?
            .iter()
            .find(|(section_z, _)| *section_z == z)
            .map(|(_, tiles)| tiles.clone())
    }

    pub fn has_collection(&self, collection: &str) -> bool {
        self.lock().collections.contains_key(collection)
    }

    /// Number of successful `write_section` calls so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }
}

fn upsert(sections: &mut Vec<(f64, ResolvedTiles)>, z: f64, tiles: ResolvedTiles) {
    match sections.binary_search_by(|(section_z, _)| section_z.total_cmp(&z)) {
        Ok(index) => sections[index].1 = tiles,
        Err(index) => sections.insert(index, (z, tiles)),
    }
}

impl TileStore for MemoryStore {
    fn list_sections(&self, collection: &str) -> Result<Vec<f64>, StoreError> {
        let inner = self.lock();
        let sections = inner
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        Ok(sections.iter().map(|(z, _)| *z).collect())
    }

    fn fetch_section(&self, collection: &str, z: f64) -> Result<ResolvedTiles, StoreError> {
        let inner = self.lock();
        let fetch_error = |message: &str| StoreError::Fetch {
            collection: collection.to_string(),
            z,
            message: message.to_string(),
        };

        if inner.failing_fetches.contains(&(collection.to_string(), z.to_bits())) {
            return Err(fetch_error("injected failure"));
        }

        let sections = inner
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        sections
            .iter()
            .find(|(section_z, _)| *section_z == z)
            .map(|(_, tiles)| tiles.clone())
            .ok_or_else(|| fetch_error("no such section"))
    }

    fn write_section(
        &self,
        collection: &str,
        z: f64,
        tiles: &ResolvedTiles,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();

        if inner.failing_writes.contains(&(collection.to_string(), z.to_bits())) {
            return Err(StoreError::Write {
                collection: collection.to_string(),
                z,
                message: "injected failure".to_string(),
            });
        }

        let sections = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        upsert(sections, z, tiles.clone());
        inner.writes += 1;
        Ok(())
    }

    fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        self.lock().collections.entry(collection.to_string()).or_default();
        Ok(())
    }
}
