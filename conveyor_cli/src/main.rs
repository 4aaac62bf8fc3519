//! CLI entrypoint for the conveyor co-simulation.
//!
//! Responsibilities:
//! - Parse config/flags and assemble the belt geometry, engines, sinks and
//!   observer
//! - Initialize tracing and manage log sinks
//! - Offer `--json` mode emitting a structured summary to stdout
//! - Map domain errors to stable exit codes

mod cli;
mod error_fmt;
mod run;
mod tracing_setup;

use std::fs;

use clap::Parser;
use conveyor_config::Config;
use eyre::WrapErr;
use serde_json::json;

use cli::{Cli, Commands, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use run::RunOverrides;
use tracing_setup::init_tracing;

fn main() -> eyre::Result<()> {
    let _ = color_eyre::install();

    let shutdown = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let shutdown_clone = std::sync::Arc::clone(&shutdown);

    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nReceived shutdown signal, stopping gracefully...");
        shutdown_clone.store(true, std::sync::atomic::Ordering::SeqCst);
    }) {
        eprintln!("Warning: Failed to set signal handler: {e}");
    }

    if let Err(e) = real_main(shutdown) {
        let json_mode = *JSON_MODE.get().unwrap_or(&false);
        let code = exit_code_for_error(&e);
        if json_mode {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(code);
    }
    Ok(())
}

fn real_main(shutdown: std::sync::Arc<std::sync::atomic::AtomicBool>) -> eyre::Result<()> {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let cfg_text = fs::read_to_string(&cli.config).wrap_err_with(|| format!("read config {:?}", cli.config))?;
    let cfg: Config = toml::from_str(&cfg_text).wrap_err_with(|| format!("parse config {:?}", cli.config))?;
    cfg.validate()?;

    match cli.cmd {
        Commands::ValidateConfig => {
            println!("{:?} is valid", cli.config);
            Ok(())
        }
        Commands::Run {
            no_viz,
            output_dir,
            duration,
            time_scale,
            jam_timeout,
            seed,
            verbose,
        } => {
            init_tracing(cli.json, &cli.log_level, output_dir.as_deref());

            let overrides = RunOverrides {
                output_dir,
                duration,
                time_scale,
                jam_timeout,
                no_viz,
                seed,
            };

            tracing::info!(seed, verbose, "starting simulation run");
            let summary = run::run_simulation(&cfg, overrides, shutdown)?;

            if cli.json {
                let obj = json!({
                    "total": summary.total,
                    "accepted": summary.accepted,
                    "rejected": summary.rejected,
                });
                println!("{obj}");
            } else {
                println!(
                    "finished: total={} accepted={} rejected={}",
                    summary.total, summary.accepted, summary.rejected
                );
            }
            Ok(())
        }
    }
}
