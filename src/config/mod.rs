//! Configuration module for stitchcons
//!
//! Provides types and parsing for `stitchcons.toml` run configuration.

pub mod loader;
pub mod schema;

pub use loader::{default_config, load_config, CliOverrides, ConfigError};
pub use schema::*;
