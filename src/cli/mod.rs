//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod apply;
mod consolidate;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::loader::{check, find_config, load_config, merge_cli_overrides, resolve_path};
use crate::config::{CliOverrides, StitchConfig};
use crate::logging;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// stitchcons - Consolidate tile transform lists of stitched image stacks
#[derive(Parser)]
#[command(name = "stitchcons")]
#[command(about = "Consolidate tile transform lists: merge affine runs, resolve shared references")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: stitchcons.toml found from the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory of the tile store
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Consolidate every section of a stack into an output stack
    Stack {
        /// Input stack
        stack: String,

        /// Output stack (default: input stack + postfix)
        #[arg(long)]
        output_stack: Option<String>,

        /// Postfix appended to the input stack name
        #[arg(long)]
        postfix: Option<String>,

        /// Lowest section z to process
        #[arg(long, allow_negative_numbers = true)]
        min_z: Option<f64>,

        /// Highest section z to process
        #[arg(long, allow_negative_numbers = true)]
        max_z: Option<f64>,

        /// Only process this section (repeatable)
        #[arg(long = "z", allow_negative_numbers = true)]
        sections: Vec<f64>,

        /// Part of each transform list to consolidate, slice syntax (e.g. "1:")
        #[arg(long, allow_hyphen_values = true)]
        slice: Option<String>,

        /// Number of sections processed in parallel
        #[arg(long)]
        pool_size: Option<usize>,

        /// Promote merged affine runs to polynomials of this degree
        #[arg(long, allow_negative_numbers = true)]
        poly_degree: Option<i64>,

        /// Stop dispatching sections after the first failure
        #[arg(long)]
        fail_fast: bool,

        /// Write {"output_stack", "numZ", "failedZ"} to this file
        #[arg(long)]
        output_json: Option<PathBuf>,
    },

    /// Consolidate a single section
    Section {
        /// Input stack
        stack: String,

        /// Section z
        #[arg(allow_negative_numbers = true)]
        z: f64,

        /// Output stack (default: input stack + postfix)
        #[arg(long)]
        output_stack: Option<String>,

        /// Postfix appended to the input stack name
        #[arg(long)]
        postfix: Option<String>,

        /// Part of each transform list to consolidate, slice syntax
        #[arg(long, allow_hyphen_values = true)]
        slice: Option<String>,

        /// Promote merged affine runs to polynomials of this degree
        #[arg(long, allow_negative_numbers = true)]
        poly_degree: Option<i64>,
    },

    /// Consolidate a section JSON file without a tile store
    Apply {
        /// Section file ({"tileSpecs": [...], "transforms": [...]})
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Part of each transform list to consolidate, slice syntax
        #[arg(long, allow_hyphen_values = true)]
        slice: Option<String>,

        /// Promote merged affine runs to polynomials of this degree
        #[arg(long, allow_negative_numbers = true)]
        poly_degree: Option<i64>,
    },

    /// List the section z values of a stack
    Sections {
        /// Stack to list
        stack: String,
    },
}

/// Load configuration, apply CLI overrides and start logging.
///
/// A relative store root from a config file is taken relative to that file;
/// a `--root` from the command line is taken as given.
pub(crate) fn prepare(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
    verbose: u8,
    quiet: bool,
) -> Result<StitchConfig, ExitCode> {
    let found = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => find_config(),
    };

    let mut config = match load_config(found.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return Err(ExitCode::from(EXIT_ERROR));
        }
    };

    if let Some(config_dir) = found.as_deref().and_then(Path::parent) {
        config.store.root = resolve_path(config_dir, &config.store.root);
    }

    merge_cli_overrides(&mut config, overrides);
    if let Err(e) = check(&config) {
        eprintln!("Error: {}", e);
        return Err(ExitCode::from(EXIT_INVALID_ARGS));
    }

    logging::init(logging::level_from_flags(config.logging.level.into(), verbose, quiet));
    if let Some(path) = &found {
        log::debug!("using config {}", path.display());
    }
    Ok(config)
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let (verbose, quiet) = (cli.verbose, cli.quiet);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Stack {
            stack,
            output_stack,
            postfix,
            min_z,
            max_z,
            sections,
            slice,
            pool_size,
            poly_degree,
            fail_fast,
            output_json,
        } => {
            let overrides = CliOverrides {
                root: cli.root.clone(),
                postfix,
                transforms_slice: slice,
                pool_size,
                poly_degree,
                fail_fast: fail_fast.then_some(true),
                ..Default::default()
            };
            let config = match prepare(config_path, &overrides, verbose, quiet) {
                Ok(config) => config,
                Err(code) => return code,
            };
            let request = consolidate::StackRequest {
                stack,
                output_stack,
                min_z,
                max_z,
                sections,
                output_json,
            };
            consolidate::run_stack_command(&config, request)
        }
        Commands::Section { stack, z, output_stack, postfix, slice, poly_degree } => {
            let overrides = CliOverrides {
                root: cli.root.clone(),
                postfix,
                transforms_slice: slice,
                poly_degree,
                ..Default::default()
            };
            match prepare(config_path, &overrides, verbose, quiet) {
                Ok(config) => consolidate::run_section_command(&config, &stack, z, output_stack),
                Err(code) => code,
            }
        }
        Commands::Apply { input, output, slice, poly_degree } => {
            let overrides =
                CliOverrides { transforms_slice: slice, poly_degree, ..Default::default() };
            match prepare(config_path, &overrides, verbose, quiet) {
                Ok(config) => apply::run_apply(&config, &input, output.as_deref()),
                Err(code) => code,
            }
        }
        Commands::Sections { stack } => {
            let overrides = CliOverrides { root: cli.root.clone(), ..Default::default() };
            match prepare(config_path, &overrides, verbose, quiet) {
                Ok(config) => apply::run_sections(&config, &stack),
                Err(code) => code,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_stack_command() {
        let cli = Cli::parse_from([
            "stitchcons",
            "stack",
            "montage",
            "--min-z",
            "-5",
            "--z",
            "1",
            "--z",
            "2.5",
            "--slice",
            ":-1",
            "--pool-size",
            "4",
            "--fail-fast",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Stack { stack, min_z, sections, slice, pool_size, fail_fast, .. } => {
                assert_eq!(stack, "montage");
                assert_eq!(min_z, Some(-5.0));
                assert_eq!(sections, vec![1.0, 2.5]);
                assert_eq!(slice.as_deref(), Some(":-1"));
                assert_eq!(pool_size, Some(4));
                assert!(fail_fast);
            }
            _ => panic!("expected stack command"),
        }
    }

    #[test]
    fn test_parse_apply_command() {
        let cli = Cli::parse_from(["stitchcons", "apply", "in.json", "-o", "out.json", "-q"]);
        assert!(cli.quiet);
        match cli.command {
            Commands::Apply { input, output, .. } => {
                assert_eq!(input, PathBuf::from("in.json"));
                assert_eq!(output, Some(PathBuf::from("out.json")));
            }
            _ => panic!("expected apply command"),
        }
    }
}
