//! JSON-on-disk tile store.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<collection>/z_<z>.json
//! ```
//!
//! Each section file holds `{"tileSpecs": [...], "transforms": [...]}`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use glob::glob;

use super::{StoreError, TileStore};
use crate::models::ResolvedTiles;

const SECTION_PREFIX: &str = "z_";
const SECTION_SUFFIX: &str = ".json";

/// Tile store backed by a directory tree of section files.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), write_lock: Mutex::new(()) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a collection's sections.
    pub fn collection_dir(&self, collection: &str) -> PathBuf {
        self.root.join(collection)
    }

    /// File holding one section.
    pub fn section_path(&self, collection: &str, z: f64) -> PathBuf {
        self.collection_dir(collection).join(section_file_name(z))
    }
}

/// `z_<z>.json`, with integral z written without a fraction (`z_1015.json`).
pub fn section_file_name(z: f64) -> String {
    format!("{}{}{}", SECTION_PREFIX, z, SECTION_SUFFIX)
}

/// Parse the z coordinate out of a section file name.
///
/// Only canonical names are accepted, so every listed section maps back to
/// the file it came from (`z_1015.0.json` and `z_01.json` are rejected).
pub fn parse_section_file_name(name: &str) -> Option<f64> {
    let z: f64 = name.strip_prefix(SECTION_PREFIX)?.strip_suffix(SECTION_SUFFIX)?.parse().ok()?;
    (z.is_finite() && section_file_name(z) == name).then_some(z)
}

impl TileStore for FileStore {
    fn list_sections(&self, collection: &str) -> Result<Vec<f64>, StoreError> {
        let dir = self.collection_dir(collection);
        if !dir.is_dir() {
            return Err(StoreError::CollectionNotFound(collection.to_string()));
        }

        let pattern = format!(
            "{}/{}*{}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            SECTION_PREFIX,
            SECTION_SUFFIX
        );
        let paths = glob(&pattern).map_err(|e| StoreError::Fetch {
            collection: collection.to_string(),
            z: f64::NAN,
            message: format!("invalid section pattern: {}", e),
        })?;

        let mut sections = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) => {
                    let name = path.file_name().and_then(|n| n.to_str());
                    match name.and_then(parse_section_file_name) {
                        Some(z) if path.is_file() => sections.push(z),
                        _ => log::debug!("skipping non-section file {}", path.display()),
                    }
                }
                Err(e) => log::warn!("error reading path: {}", e),
            }
        }

        sections.sort_by(f64::total_cmp);
        sections.dedup();
        Ok(sections)
    }

    fn fetch_section(&self, collection: &str, z: f64) -> Result<ResolvedTiles, StoreError> {
        let path = self.section_path(collection, z);
        let file = File::open(&path).map_err(|e| StoreError::Fetch {
            collection: collection.to_string(),
            z,
            message: format!("{}: {}", path.display(), e),
        })?;

        let tiles: ResolvedTiles = serde_json::from_reader(BufReader::new(file))?;
        Ok(tiles)
    }

    fn write_section(
        &self,
        collection: &str,
        z: f64,
        tiles: &ResolvedTiles,
    ) -> Result<(), StoreError> {
        let dir = self.collection_dir(collection);
        if !dir.is_dir() {
            return Err(StoreError::CollectionNotFound(collection.to_string()));
        }

        let write_error = |e: &dyn std::fmt::Display| StoreError::Write {
            collection: collection.to_string(),
            z,
            message: e.to_string(),
        };

        let path = self.section_path(collection, z);
        let tmp_path = dir.join(format!(".{}.tmp", section_file_name(z)));

        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let file = File::create(&tmp_path).map_err(|e| write_error(&e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, tiles)?;
        writer.flush().map_err(|e| write_error(&e))?;
        drop(writer);

        // Readers only ever see a complete section file.
        fs::rename(&tmp_path, &path).map_err(|e| write_error(&e))?;
        log::debug!("wrote {} tiles to {}", tiles.tile_specs.len(), path.display());
        Ok(())
    }

    fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        fs::create_dir_all(self.collection_dir(collection))?;
        Ok(())
    }
}
