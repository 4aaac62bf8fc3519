//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "conveyor-sim", version, about = "Packaging conveyor co-simulation")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "conveyor.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the simulation
    Run {
        /// Disable the terminal observer
        #[arg(long, action = ArgAction::SetTrue)]
        no_viz: bool,
        /// Override simulation.log_interval_sec / write CSV output here
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Override simulation.duration_sec
        #[arg(long, value_name = "SEC")]
        duration: Option<f64>,
        /// Override simulation.time_scale
        #[arg(long, value_name = "X")]
        time_scale: Option<f64>,
        /// Override rJamTimeoutSec
        #[arg(long, value_name = "SEC")]
        jam_timeout: Option<f64>,
        /// Seed for the RNG driving arrivals and jam injection
        #[arg(long, value_name = "INT", default_value_t = 0)]
        seed: u64,
        /// Print per-event lines in addition to periodic status lines
        #[arg(long, short = 'v', action = ArgAction::SetTrue)]
        verbose: bool,
    },
    /// Parse and validate a config file without running the simulation
    ValidateConfig,
}
