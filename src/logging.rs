//! Process-wide logger setup.
//!
//! Library code only talks to the `log` facade; binaries call [`init`] once.

use std::sync::Once;

use log::LevelFilter;

static INIT_LOGGER: Once = Once::new();

/// Install the `env_logger` backend at `level`.
///
/// A `RUST_LOG` directive, when set, overrides `level`. Later calls are
/// no-ops, so tests and embedding callers may call this freely.
pub fn init(level: LevelFilter) {
    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(level);

        if let Ok(directives) = std::env::var("RUST_LOG") {
            builder.parse_filters(&directives);
        }

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{:5}] {}", record.level(), record.args())
        });

        let _ = builder.try_init();
    });
}

/// Pick the effective level from the configured one and `-v`/`-q` counts.
///
/// Each `-v` raises verbosity one step above the configured level; any `-q`
/// silences everything but errors.
pub fn level_from_flags(configured: LevelFilter, verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    let mut level = configured;
    for _ in 0..verbose {
        level = match level {
            LevelFilter::Off => LevelFilter::Error,
            LevelFilter::Error => LevelFilter::Warn,
            LevelFilter::Warn => LevelFilter::Info,
            LevelFilter::Info => LevelFilter::Debug,
            LevelFilter::Debug | LevelFilter::Trace => LevelFilter::Trace,
        };
    }
    level
}
