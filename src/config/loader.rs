//! Configuration loading and discovery for `stitchcons.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::StitchConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file searched for.
pub const CONFIG_FILE_NAME: &str = "stitchcons.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse stitchcons.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override store root directory
    pub root: Option<PathBuf>,
    /// Override output stack postfix
    pub postfix: Option<String>,
    /// Override transform slice
    pub transforms_slice: Option<String>,
    /// Number of parallel section workers
    pub pool_size: Option<usize>,
    /// Override polynomial degree
    pub poly_degree: Option<i64>,
    /// Stop dispatching after the first failed section
    pub fail_fast: Option<bool>,
}

/// Locate the config file for this process.
///
/// The nearest `stitchcons.toml` in the working directory or one of its
/// ancestors wins over the per-user file.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(|cwd| find_config_from(&cwd)).or_else(find_xdg_config)
}

/// Per-user config file: `$XDG_CONFIG_HOME/stitchcons/stitchcons.toml`,
/// with `~/.config` when the variable is unset or empty.
pub fn find_xdg_config() -> Option<PathBuf> {
    let base = match env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(env::var_os("HOME")?).join(".config"),
    };
    Some(base.join("stitchcons").join(CONFIG_FILE_NAME)).filter(|path| path.is_file())
}

/// Nearest `stitchcons.toml` in `start` or one of its ancestors.
pub fn find_config_from(start: &Path) -> Option<PathBuf> {
    start.ancestors().map(|dir| dir.join(CONFIG_FILE_NAME)).find(|path| path.is_file())
}

/// Load configuration from a stitchcons.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the default
/// configuration.
///
/// # Example
/// ```ignore
/// let config = load_config(None)?;
/// let config = load_config(Some(Path::new("runs/stitchcons.toml")))?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<StitchConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => {
            log::debug!("loading config from {}", p.display());
            load_config_file(&p)
        }
        None => Ok(default_config()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<StitchConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: StitchConfig = toml::from_str(&contents)?;

    check(&config)?;
    Ok(config)
}

/// Turn validation messages into a `ConfigError`.
pub fn check(config: &StitchConfig) -> Result<(), ConfigError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }
    Ok(())
}

/// Configuration used when no stitchcons.toml is found.
pub fn default_config() -> StitchConfig {
    StitchConfig::default()
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut StitchConfig, overrides: &CliOverrides) {
    if let Some(ref root) = overrides.root {
        config.store.root = root.clone();
    }

    if let Some(ref postfix) = overrides.postfix {
        config.consolidate.postfix = postfix.clone();
    }

    if let Some(ref slice) = overrides.transforms_slice {
        config.consolidate.transforms_slice = slice.clone();
    }

    if let Some(pool_size) = overrides.pool_size {
        config.consolidate.pool_size = pool_size;
    }

    if let Some(poly_degree) = overrides.poly_degree {
        config.consolidate.poly_degree = poly_degree;
    }

    if let Some(fail_fast) = overrides.fail_fast {
        config.consolidate.fail_fast = fail_fast;
    }
}

/// Resolve a path relative to the directory holding the config file.
///
/// If the path is absolute, returns it unchanged.
pub fn resolve_path(config_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use serial_test::serial;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &Path, contents: &[u8]) -> PathBuf {
        let config_path = dir.join(CONFIG_FILE_NAME);
        File::create(&config_path)
            .expect("should create config file")
            .write_all(contents)
            .expect("should write config content");
        config_path
    }

    #[test]
    fn test_find_config_in_current_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), b"[consolidate]\npool_size = 2");

        let found = find_config_from(temp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), b"");

        let subdir = temp.path().join("runs").join("2024");
        fs::create_dir_all(&subdir).expect("should create subdirectories");

        let found = find_config_from(&subdir);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_not_found() {
        let temp = TempDir::new().expect("should create temp dir");
        assert_eq!(find_config_from(temp.path()), None);
    }

    #[test]
    #[serial]
    fn test_find_xdg_config() {
        let temp = TempDir::new().expect("should create temp dir");
        let saved = env::var_os("XDG_CONFIG_HOME");
        env::set_var("XDG_CONFIG_HOME", temp.path());

        assert_eq!(find_xdg_config(), None);
        let dir = temp.path().join("stitchcons");
        fs::create_dir_all(&dir).expect("should create config dir");
        let config_path = write_config(&dir, b"");
        assert_eq!(find_xdg_config(), Some(config_path));

        match saved {
            Some(value) => env::set_var("XDG_CONFIG_HOME", value),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(
            temp.path(),
            br#"
[store]
root = "stacks"

[consolidate]
transforms_slice = "1:"
pool_size = 3
"#,
        );

        let config = load_config(Some(&config_path)).expect("should load valid config");
        assert_eq!(config.store.root, PathBuf::from("stacks"));
        assert_eq!(config.consolidate.transforms_slice, "1:");
        assert_eq!(config.consolidate.pool_size, 3);
        assert_eq!(config.consolidate.postfix, "_CONS");
    }

    #[test]
    fn test_load_config_missing_file_is_error() {
        let temp = TempDir::new().expect("should create temp dir");
        let result = load_config(Some(&temp.path().join("nonexistent.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), b"this is not valid toml {{{");

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_validation_error() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path =
            write_config(temp.path(), b"[consolidate]\npool_size = 0\npoly_degree = -3\n");

        match load_config(Some(&config_path)) {
            Err(ConfigError::Validation(messages)) => assert_eq!(messages.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_load_config_discovers_from_cwd() {
        let temp = TempDir::new().expect("should create temp dir");
        write_config(temp.path(), b"[consolidate]\npostfix = \"_FOUND\"");
        let previous = env::current_dir().expect("should read cwd");

        env::set_current_dir(temp.path()).expect("should enter temp dir");
        let config = load_config(None);
        env::set_current_dir(previous).expect("should restore cwd");

        assert_eq!(config.expect("should load").consolidate.postfix, "_FOUND");
    }

    #[test]
    fn test_merge_cli_overrides() {
        let mut config = default_config();
        let overrides = CliOverrides {
            root: Some(PathBuf::from("/mnt/render")),
            transforms_slice: Some("2:".to_string()),
            pool_size: Some(16),
            poly_degree: Some(3),
            fail_fast: Some(true),
            ..Default::default()
        };

        merge_cli_overrides(&mut config, &overrides);
        assert_eq!(config.store.root, PathBuf::from("/mnt/render"));
        assert_eq!(config.consolidate.transforms_slice, "2:");
        assert_eq!(config.consolidate.pool_size, 16);
        assert_eq!(config.consolidate.poly_degree, 3);
        assert!(config.consolidate.fail_fast);
        assert_eq!(config.consolidate.postfix, "_CONS");
    }

    #[test]
    fn test_merge_cli_overrides_empty_keeps_config() {
        let mut config = default_config();
        merge_cli_overrides(&mut config, &CliOverrides::default());
        assert_eq!(config.consolidate.pool_size, 10);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_resolve_path() {
        let root = Path::new("/project");
        assert_eq!(resolve_path(root, Path::new("/abs")), PathBuf::from("/abs"));
        assert_eq!(resolve_path(root, Path::new("data")), PathBuf::from("/project/data"));
    }
}
