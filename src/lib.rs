//! stitchcons - Transform list consolidation for stitched image stacks
//!
//! This library provides functionality to:
//! - Model tile transform chains (affine, polynomial, opaque, shared references, nested lists)
//! - Resolve shared references and flatten nested lists
//! - Merge contiguous affine runs, optionally promoting them to polynomials
//! - Consolidate whole stacks section by section with a bounded worker pool

pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod registry;
pub mod stack;
pub mod store;
pub mod transforms;
