//! Stack consolidation
//!
//! Runs transform consolidation over whole stacks: every tile of every
//! selected section is rewritten and the result written to an output stack.
//!
//! # Overview
//!
//! - **Context**: which stack, which sections, and how to consolidate
//! - **Section worker**: fetch one section, rewrite its tiles, write it back
//! - **Parallel driver**: fan section workers out over a bounded pool and
//!   collect per-section results
//!
//! # Example
//!
//! ```ignore
//! use stitchcons::stack::{run_stack, StackContext};
//! use stitchcons::store::FileStore;
//!
//! let store = FileStore::new("render-data");
//! let context = StackContext::new("montage").with_range("1:".parse()?);
//! let result = run_stack(&store, &context)?;
//! println!("{}", result.summary());
//! ```

pub mod context;
pub mod parallel;
pub mod result;
pub mod section;

pub use context::*;
pub use parallel::*;
pub use result::*;
pub use section::*;

use crate::store::StoreError;
use crate::transforms::TransformError;
use thiserror::Error;

/// Failure of a single section.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SectionError {
    /// A tile's transform list could not be consolidated
    #[error("tile '{tile_id}': {source}")]
    Tile {
        tile_id: String,
        #[source]
        source: TransformError,
    },

    /// The section's shared transform pool is malformed
    #[error("shared transforms: {0}")]
    Pool(#[source] TransformError),

    /// Reading or writing the section failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure of a whole stack run, raised before any section is dispatched.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StackError {
    /// Run parameters are inconsistent
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Degree or range is invalid
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Listing the input stack or creating the output stack failed
    #[error(transparent)]
    Store(#[from] StoreError),
}
