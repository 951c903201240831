//! Configuration schema types for `stitchcons.toml`
//!
//! Defines the structure and validation rules for consolidation runs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::transforms::{PolyDegree, TransformError, TransformRange};

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Tile store location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory holding one sub-directory per collection
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from("render-data")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { root: default_root() }
    }
}

/// Consolidation run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidateConfig {
    /// Appended to the input stack name when no output stack is given
    #[serde(default = "default_postfix")]
    pub postfix: String,
    /// Slice of each tile's transform list to consolidate (e.g. `"1:"`)
    #[serde(default = "default_transforms_slice")]
    pub transforms_slice: String,
    /// Number of sections processed concurrently
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Promote merged runs to polynomials of this degree (0 keeps them affine)
    #[serde(default)]
    pub poly_degree: i64,
    /// Stop dispatching sections after the first failure
    #[serde(default)]
    pub fail_fast: bool,
}

fn default_postfix() -> String {
    "_CONS".to_string()
}

fn default_transforms_slice() -> String {
    ":".to_string()
}

fn default_pool_size() -> usize {
    10
}

impl Default for ConsolidateConfig {
    fn default() -> Self {
        Self {
            postfix: default_postfix(),
            transforms_slice: default_transforms_slice(),
            pool_size: default_pool_size(),
            poly_degree: 0,
            fail_fast: false,
        }
    }
}

impl ConsolidateConfig {
    /// Parsed transform range.
    pub fn transform_range(&self) -> Result<TransformRange, TransformError> {
        self.transforms_slice.parse()
    }

    /// Validated polynomial degree.
    pub fn degree(&self) -> Result<PolyDegree, TransformError> {
        PolyDegree::new(self.poly_degree)
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
}

/// Complete stitchcons.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StitchConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub consolidate: ConsolidateConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "consolidate.pool_size")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stitchcons.toml: '{}' {}", self.field, self.message)
    }
}

impl StitchConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.consolidate.postfix.is_empty() {
            errors.push(ConfigValidationError {
                field: "consolidate.postfix".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if self.consolidate.pool_size == 0 {
            errors.push(ConfigValidationError {
                field: "consolidate.pool_size".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        if let Err(e) = self.consolidate.transform_range() {
            errors.push(ConfigValidationError {
                field: "consolidate.transforms_slice".to_string(),
                message: e.to_string(),
            });
        }

        if let Err(e) = self.consolidate.degree() {
            errors.push(ConfigValidationError {
                field: "consolidate.poly_degree".to_string(),
                message: e.to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: StitchConfig = toml::from_str("").unwrap();
        assert_eq!(config.store.root, PathBuf::from("render-data"));
        assert_eq!(config.consolidate.postfix, "_CONS");
        assert_eq!(config.consolidate.transforms_slice, ":");
        assert_eq!(config.consolidate.pool_size, 10);
        assert_eq!(config.consolidate.poly_degree, 0);
        assert!(!config.consolidate.fail_fast);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.is_valid());
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[store]
root = "/data/render"

[consolidate]
postfix = "_MERGED"
transforms_slice = "1:"
pool_size = 4
poly_degree = 2
fail_fast = true

[logging]
level = "debug"
"#;
        let config: StitchConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.store.root, PathBuf::from("/data/render"));
        assert_eq!(config.consolidate.postfix, "_MERGED");
        let range = config.consolidate.transform_range().unwrap();
        assert_eq!(range, TransformRange::new(Some(1), None));
        assert_eq!(config.consolidate.pool_size, 4);
        assert_eq!(config.consolidate.degree().unwrap().get(), 2);
        assert!(config.consolidate.fail_fast);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.is_valid());
    }

    #[test]
    fn test_validation_zero_pool() {
        let config: StitchConfig = toml::from_str("[consolidate]\npool_size = 0").unwrap();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "consolidate.pool_size"));
    }

    #[test]
    fn test_validation_negative_degree() {
        let config: StitchConfig = toml::from_str("[consolidate]\npoly_degree = -1").unwrap();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "consolidate.poly_degree"));
    }

    #[test]
    fn test_validation_degree_above_limit() {
        let config: StitchConfig = toml::from_str("[consolidate]
poly_degree = 100000").unwrap();
        assert!(!config.is_valid());
        assert!(config.validate().iter().any(|e| e.field == "consolidate.poly_degree"));
    }

    #[test]
    fn test_validation_bad_slice() {
        let config: StitchConfig =
            toml::from_str("[consolidate]\ntransforms_slice = \"x:y\"").unwrap();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "consolidate.transforms_slice"));
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(log::LevelFilter::from(LogLevel::Warn), log::LevelFilter::Warn);
        assert_eq!(log::LevelFilter::from(LogLevel::Off), log::LevelFilter::Off);
    }
}
