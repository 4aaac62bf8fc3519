//! Tracing subscriber setup: pretty or JSON console output, plus an
//! optional rolling file appender when the config names an output
//! directory.

use crate::cli::FILE_GUARD;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber. `json` selects JSON-lines
/// formatting on stdout (so `--json` runs stay machine-parseable); pretty
/// formatting otherwise goes to stderr so stdout stays clean for
/// machine-readable run output. `file_dir`, if given, also logs to a daily
/// rolling file under that directory.
pub fn init_tracing(json: bool, log_level: &str, file_dir: Option<&std::path::Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    use tracing_subscriber::prelude::*;

    let file_layer = file_dir.map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, "conveyor-sim.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .boxed()
    });

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        let console_layer = fmt::layer().json().with_writer(std::io::stdout).boxed();
        match file_layer {
            Some(fl) => registry.with(console_layer).with(fl).init(),
            None => registry.with(console_layer).init(),
        }
    } else {
        let console_layer = fmt::layer().with_writer(std::io::stderr).boxed();
        match file_layer {
            Some(fl) => registry.with(console_layer).with(fl).init(),
            None => registry.with(console_layer).init(),
        }
    }
}
