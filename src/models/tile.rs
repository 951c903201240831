//! Tile and section models.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::transform::TransformSpec;
use crate::transforms::Transform;

/// One acquired tile and its transform chain.
///
/// Fields the engine does not use (image pyramid, layout, bounding box, ...)
/// are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TileSpec {
    #[serde(rename = "tileId")]
    pub tile_id: String,
    pub z: f64,
    #[serde(
        default,
        serialize_with = "serialize_transform_list",
        deserialize_with = "deserialize_transform_list"
    )]
    pub transforms: Vec<Transform>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TileSpec {
    pub fn new(tile_id: impl Into<String>, z: f64, transforms: Vec<Transform>) -> Self {
        Self { tile_id: tile_id.into(), z, transforms, extra: Map::new() }
    }

    /// Identifiers of shared transforms this tile still references.
    pub fn referenced_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        let mut pending: Vec<&Transform> = self.transforms.iter().rev().collect();
        while let Some(transform) = pending.pop() {
            match transform {
                Transform::Reference { ref_id } => ids.push(ref_id.as_str()),
                Transform::List(items) => pending.extend(items.iter().rev()),
                _ => {}
            }
        }
        ids
    }
}

/// The tile store wraps a tile's chain in a top-level list spec.
fn serialize_transform_list<S: Serializer>(
    list: &[Transform],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    TransformSpec::List {
        spec_list: list.iter().cloned().map(TransformSpec::from).collect(),
        id: None,
    }
    .serialize(serializer)
}

fn deserialize_transform_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<Transform>, D::Error> {
    match Transform::deserialize(deserializer)? {
        Transform::List(items) => Ok(items),
        single => Ok(vec![single]),
    }
}

/// All tiles of one section together with the shared transforms they use.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResolvedTiles {
    #[serde(rename = "tileSpecs", default)]
    pub tile_specs: Vec<TileSpec>,
    /// Shared transform pool; every entry carries an `id`.
    #[serde(default)]
    pub transforms: Vec<TransformSpec>,
}

impl ResolvedTiles {
    pub fn new(tile_specs: Vec<TileSpec>, transforms: Vec<TransformSpec>) -> Self {
        Self { tile_specs, transforms }
    }

    pub fn is_empty(&self) -> bool {
        self.tile_specs.is_empty()
    }
}
