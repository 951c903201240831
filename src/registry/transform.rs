//! Shared transform pool.

use std::collections::HashMap;

use crate::models::TransformSpec;
use crate::transforms::{LeafTransform, Transform, TransformError};

use super::traits::Registry;

/// Registry of shared transforms keyed by transform id.
///
/// Many tiles of a section can reference the same entry (typically a lens
/// correction). Entries are always concrete: references and nested lists
/// are rejected on registration, so a lookup never needs further resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformRegistry {
    transforms: HashMap<String, Transform>,
}

impl TransformRegistry {
    /// Create a new empty transform registry.
    pub fn new() -> Self {
        Self { transforms: HashMap::new() }
    }

    /// Build a registry from the shared transform specs of a section.
    ///
    /// Every spec must carry an `id` and describe a concrete transform.
    pub fn from_specs(specs: &[TransformSpec]) -> Result<Self, TransformError> {
        let mut registry = Self::new();
        for spec in specs {
            let id = spec.id().ok_or_else(|| {
                TransformError::InvalidPoolEntry("<shared transform without id>".to_string())
            })?;
            let transform = Transform::try_from(spec.clone())?;
            registry.register(id, transform)?;
        }
        Ok(registry)
    }

    /// Register a shared transform; a later registration replaces an earlier one.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        transform: Transform,
    ) -> Result<(), TransformError> {
        let id = id.into();
        let transform = match transform {
            // The pool key is the id; resolved copies are inlined without it.
            Transform::Opaque(leaf) => Transform::Opaque(LeafTransform { id: None, ..leaf }),
            other if other.is_concrete() => other,
            _ => return Err(TransformError::InvalidPoolEntry(id)),
        };
        self.transforms.insert(id, transform);
        Ok(())
    }

    /// Get a shared transform by id.
    pub fn get(&self, id: &str) -> Option<&Transform> {
        self.transforms.get(id)
    }

    /// Look up a reference, failing when the id is unknown.
    pub fn resolve(&self, id: &str) -> Result<&Transform, TransformError> {
        self.get(id).ok_or_else(|| TransformError::UnresolvedReference(id.to_string()))
    }

    /// Check if a transform with the given id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.transforms.contains_key(id)
    }

    /// Get the number of registered transforms.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Iterate over all transforms in the registry.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Transform)> {
        self.transforms.iter()
    }
}

impl Registry<Transform> for TransformRegistry {
    fn contains(&self, id: &str) -> bool {
        self.transforms.contains_key(id)
    }

    fn get(&self, id: &str) -> Option<&Transform> {
        self.transforms.get(id)
    }

    fn len(&self) -> usize {
        self.transforms.len()
    }

    fn names(&self) -> Box<dyn Iterator<Item = &String> + '_> {
        Box::new(self.transforms.keys())
    }
}
