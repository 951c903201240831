//! Registry trait and the shared transform pool.
//!
//! - A `Registry` trait for consistent lookup interfaces
//! - `TransformRegistry`, the per-section pool that transform references
//!   resolve against
//!
//! `SharedPool` is the name the consolidation engine uses for the pool.

mod traits;
mod transform;

pub use traits::Registry;
pub use transform::TransformRegistry;

/// Read-only pool of shared transforms passed into resolution.
pub type SharedPool = TransformRegistry;
