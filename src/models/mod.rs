//! Data models for tiles, sections and transform specifications

mod tile;
mod transform;

pub use tile::{ResolvedTiles, TileSpec};
pub use transform::{is_affine_class, TransformSpec};
