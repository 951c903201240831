//! Common trait for registries that store named items.

/// Common trait for registries that store named items.
///
/// This trait provides a unified interface for registries that map string
/// identifiers to values, so lookups read the same whichever pool backs them.
///
/// # Type Parameters
///
/// * `V` - The type of value stored in the registry
///
/// # Example
///
/// ```
/// use stitchcons::registry::{Registry, TransformRegistry};
/// use stitchcons::transforms::{AffineModel, Transform};
///
/// let mut pool = TransformRegistry::new();
/// pool.register("lens", Transform::Affine(AffineModel::identity())).unwrap();
///
/// assert!(pool.contains("lens"));
/// assert_eq!(pool.len(), 1);
/// ```
pub trait Registry<V> {
    /// Check if an item with the given identifier exists in the registry.
    fn contains(&self, id: &str) -> bool;

    /// Get an item by identifier.
    ///
    /// Returns `None` if no item with the given identifier exists.
    fn get(&self, id: &str) -> Option<&V>;

    /// Get the number of items in the registry.
    fn len(&self) -> usize;

    /// Check if the registry is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get an iterator over all identifiers in the registry.
    fn names(&self) -> Box<dyn Iterator<Item = &String> + '_>;
}
