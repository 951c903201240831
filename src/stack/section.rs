//! Section worker: consolidates every tile of one section.

use std::collections::HashSet;

use rayon::prelude::*;

use crate::models::{ResolvedTiles, TileSpec, TransformSpec};
use crate::registry::SharedPool;
use crate::stack::SectionError;
use crate::store::TileStore;
use crate::transforms::{consolidate_range, PolyDegree, TransformRange};

/// What a section worker produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionOutput {
    /// Section z coordinate
    pub z: f64,
    /// Number of tiles rewritten
    pub tiles: usize,
    /// Transform count over all tiles before consolidation (nested lists expanded)
    pub transforms_before: usize,
    /// Transform count over all tiles after consolidation
    pub transforms_after: usize,
    /// Shared transforms written alongside the tiles
    pub shared_transforms: usize,
}

/// Consolidate the tiles of an already fetched section.
///
/// Each tile's `range` is resolved against the section's shared transforms
/// and merged; the rest of its list stays in place. The returned section
/// keeps only the shared transforms its tiles still reference.
pub fn consolidate_section(
    section: &ResolvedTiles,
    range: &TransformRange,
    degree: PolyDegree,
) -> Result<ResolvedTiles, SectionError> {
    let pool = SharedPool::from_specs(&section.transforms).map_err(SectionError::Pool)?;

    let tile_specs = section
        .tile_specs
        .par_iter()
        .map(|tile| {
            let transforms = consolidate_range(&tile.transforms, range, &pool, degree).map_err(
                |source| SectionError::Tile { tile_id: tile.tile_id.clone(), source },
            )?;
            log::debug!(
                "tile {}: {} -> {} transforms",
                tile.tile_id,
                tile.transforms.len(),
                transforms.len()
            );
            Ok(TileSpec { transforms, ..tile.clone() })
        })
        .collect::<Result<Vec<_>, SectionError>>()?;

    let referenced: HashSet<&str> =
        tile_specs.iter().flat_map(|tile| tile.referenced_ids()).collect();
    let transforms: Vec<TransformSpec> = section
        .transforms
        .iter()
        .filter(|spec| spec.id().map_or(false, |id| referenced.contains(id)))
        .cloned()
        .collect();

    Ok(ResolvedTiles::new(tile_specs, transforms))
}

/// Consolidate section `z` of `source` into `dest`.
///
/// Creates `dest` if needed, then fetches the section, rewrites every tile
/// and writes the result with a single `write_section` call. A section
/// without tiles is written back empty.
pub fn run_section<S: TileStore + ?Sized>(
    store: &S,
    source: &str,
    dest: &str,
    z: f64,
    range: &TransformRange,
    degree: PolyDegree,
) -> Result<SectionOutput, SectionError> {
    store.ensure_collection(dest)?;

    let section = store.fetch_section(source, z)?;
    let consolidated = consolidate_section(&section, range, degree)?;

    let output = SectionOutput {
        z,
        tiles: consolidated.tile_specs.len(),
        transforms_before: count_transforms(&section),
        transforms_after: count_transforms(&consolidated),
        shared_transforms: consolidated.transforms.len(),
    };

    store.write_section(dest, z, &consolidated)?;
    log::info!(
        "section z={}: {} tiles, {} -> {} transforms written to '{}'",
        z,
        output.tiles,
        output.transforms_before,
        output.transforms_after,
        dest
    );
    Ok(output)
}

fn count_transforms(section: &ResolvedTiles) -> usize {
    section.tile_specs.iter().flat_map(|tile| &tile.transforms).map(|t| t.flat_len()).sum()
}
