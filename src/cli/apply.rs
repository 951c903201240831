//! Offline commands (apply, sections)

use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::Path;
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::config::StitchConfig;
use crate::models::ResolvedTiles;
use crate::stack::consolidate_section;
use crate::store::{FileStore, TileStore};

/// Run the apply command: consolidate a section file without a store
pub(crate) fn run_apply(config: &StitchConfig, input: &Path, output: Option<&Path>) -> ExitCode {
    let (range, degree) =
        match (config.consolidate.transform_range(), config.consolidate.degree()) {
            (Ok(range), Ok(degree)) => (range, degree),
            (Err(e), _) | (_, Err(e)) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_INVALID_ARGS);
            }
        };

    let section: ResolvedTiles = match File::open(input)
        .map_err(|e| e.to_string())
        .and_then(|file| serde_json::from_reader(BufReader::new(file)).map_err(|e| e.to_string()))
    {
        Ok(section) => section,
        Err(e) => {
            eprintln!("Error: Cannot read '{}': {}", input.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let consolidated = match consolidate_section(&section, &range, degree) {
        Ok(consolidated) => consolidated,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let json = match serde_json::to_string_pretty(&consolidated) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = fs::write(path, json + "\n") {
                eprintln!("Error: Cannot write '{}': {}", path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
            eprintln!(
                "Consolidated {} tiles from {} into {}",
                consolidated.tile_specs.len(),
                input.display(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{}", json) {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Run the sections command: list a stack's section z values
pub(crate) fn run_sections(config: &StitchConfig, stack: &str) -> ExitCode {
    let store = FileStore::new(&config.store.root);
    match store.list_sections(stack) {
        Ok(sections) => {
            for z in sections {
                println!("{}", z);
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
