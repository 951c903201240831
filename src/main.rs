//! stitchcons - Command-line tool for consolidating tile transform lists

use std::process::ExitCode;

use stitchcons::cli;

fn main() -> ExitCode {
    cli::run()
}
