//! Stack and section command implementations

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::config::StitchConfig;
use crate::stack::{run_section, run_stack, StackContext, StackError};
use crate::store::FileStore;

/// Arguments of the stack command that have no config file counterpart
pub(crate) struct StackRequest {
    pub stack: String,
    pub output_stack: Option<String>,
    pub min_z: Option<f64>,
    pub max_z: Option<f64>,
    pub sections: Vec<f64>,
    pub output_json: Option<PathBuf>,
}

/// Exit code for a failure surfaced before any section was dispatched.
fn stack_error_code(error: &StackError) -> u8 {
    match error {
        StackError::InvalidParameter(_) => EXIT_INVALID_ARGS,
        StackError::Transform(e) if e.is_precondition() => EXIT_INVALID_ARGS,
        _ => EXIT_ERROR,
    }
}

fn build_context(
    config: &StitchConfig,
    stack: &str,
    output_stack: Option<String>,
) -> Result<StackContext, StackError> {
    let mut context = StackContext::from_config(stack, &config.consolidate)?;
    if let Some(output_stack) = output_stack {
        context = context.with_output_stack(output_stack);
    }
    Ok(context)
}

/// Run the stack command
pub(crate) fn run_stack_command(config: &StitchConfig, request: StackRequest) -> ExitCode {
    let mut context = match build_context(config, &request.stack, request.output_stack) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(stack_error_code(&e));
        }
    };
    context = context.with_z_bounds(request.min_z, request.max_z);
    if !request.sections.is_empty() {
        context = context.with_sections(request.sections);
    }

    let store = FileStore::new(&config.store.root);
    let result = match run_stack(&store, &context) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(stack_error_code(&e));
        }
    };

    println!("{}", result.summary());

    if let Some(path) = &request.output_json {
        let written = File::create(path).map_err(|e| e.to_string()).and_then(|file| {
            serde_json::to_writer_pretty(BufWriter::new(file), &result.to_output())
                .map_err(|e| e.to_string())
        });
        if let Err(e) = written {
            eprintln!("Error writing {}: {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    }

    if result.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

/// Run the section command
pub(crate) fn run_section_command(
    config: &StitchConfig,
    stack: &str,
    z: f64,
    output_stack: Option<String>,
) -> ExitCode {
    let prepared = build_context(config, stack, output_stack)
        .and_then(|context| context.validate().map(|degree| (context, degree)));
    let (context, degree) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(stack_error_code(&e));
        }
    };

    let store = FileStore::new(&config.store.root);
    let dest = context.output_stack();
    match run_section(&store, stack, &dest, z, context.range(), degree) {
        Ok(output) => {
            println!(
                "Section z={}: {} tiles, {} -> {} transforms, written to '{}'",
                z, output.tiles, output.transforms_before, output.transforms_after, dest
            );
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: section z={}: {}", z, e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
