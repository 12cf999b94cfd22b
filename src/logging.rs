//! Logging setup.
//!
//! Uses the `log` facade with an `env_logger` backend. The level comes from
//! `RUST_LOG` when set, otherwise from the CLI flags: `-q` shows errors only,
//! `-v` adds debug output and `-vv` adds trace output. The default is info.
//!
//! Debug builds prefix every line with a timestamp (and the module path when
//! verbose); release builds print the level and message only.

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

/// Initialize logging from the CLI verbosity flags.
///
/// Safe to call more than once: later calls leave the first logger in place,
/// which lets tests drive `run_app` repeatedly in one process.
pub fn init_logging(verbose: u8, quiet: bool) {
    let from_env = std::env::var_os("RUST_LOG").is_some();

    let mut builder = Builder::new();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_ok() {
        log::debug!(
            "Logging initialized at level {} ({})",
            current_level_name(),
            if from_env { "RUST_LOG" } else { "CLI flags" }
        );
    }
}

/// Log level for the given flags; `quiet` wins over `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp_seconds();
            let level = record.level();
            let style = buf.default_level_style(level);
            if verbose > 0 {
                writeln!(
                    buf,
                    "{timestamp} {style}{level:<5}{style:#} [{}] {}",
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(buf, "{timestamp} {style}{level:<5}{style:#} {}", record.args())
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let style = buf.default_level_style(level);
            writeln!(buf, "{style}{level:<5}{style:#} {}", record.args())
        });
    }
}

/// Name of the currently active maximum log level.
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
