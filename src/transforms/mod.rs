//! Transform algebra and transform list consolidation
//!
//! # Module Structure
//!
//! - [`types`] - Core transform types and error definitions
//! - [`affine`] - 2D affine models and their composition
//! - [`polynomial`] - 2D polynomial transforms and affine promotion
//! - [`resolve`] - Flattening nested lists and dereferencing the shared pool
//! - [`consolidate`] - Merging contiguous affine runs
//! - [`range`] - Slice-style selection of the transforms to consolidate

pub mod affine;
pub mod consolidate;
pub mod polynomial;
pub mod range;
pub mod resolve;
pub mod types;

// Re-export main types at the module level for convenience
pub use affine::{AffineModel, AFFINE_CLASS};
pub use consolidate::{consolidate, consolidate_flat, consolidate_range};
pub use polynomial::{term_count, Polynomial2D, POLYNOMIAL_CLASS};
pub use range::TransformRange;
pub use resolve::{flatten, resolve, MAX_NESTING_DEPTH};
pub use types::{LeafTransform, PolyDegree, Transform, TransformError, MAX_POLY_DEGREE};

/// An ordered transform chain; composition order is list order.
pub type TransformList = Vec<Transform>;

/// Result type alias for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;
