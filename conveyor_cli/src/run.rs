//! Orchestration for the `run` subcommand: load config, build the belt
//! geometry and engines, wire up sinks/observer, run the driver loop.

use conveyor_config::Config;
use conveyor_core::{
    ArrivalCfg, ConveyorGeometry, CsvSink, Driver, JamCfg, NullObserver, NullSink, Observer, RunParams, RunSummary,
    Sink, Tag, TerminalObserver,
};
use conveyor_traits::MonotonicClock;
use eyre::WrapErr;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub output_dir: Option<PathBuf>,
    pub duration: Option<f64>,
    pub time_scale: Option<f64>,
    pub jam_timeout: Option<f64>,
    pub no_viz: bool,
    pub seed: u64,
}

pub fn run_simulation(cfg: &Config, overrides: RunOverrides, shutdown: Arc<AtomicBool>) -> eyre::Result<RunSummary> {
    let geometry = ConveyorGeometry::from_spans(
        cfg.conveyor.total_length_mm,
        cfg.conveyor.infeed_to_diverter_mm,
        cfg.conveyor.diverter_to_outfeed_mm,
        cfg.conveyor.belt_speed_mms,
        cfg.conveyor.box_length_mm,
    );
    let arrivals = ArrivalCfg::from(&cfg.boxes);
    let jams = JamCfg::from(&cfg.jams);

    let mut driver = Driver::new(geometry, arrivals, jams, overrides.seed);
    if let Some(timeout) = overrides.jam_timeout {
        driver.tags_mut().write_real(Tag::JamTimeoutSec, timeout);
    }

    let output_dir = overrides.output_dir.or_else(|| cfg.logging.output_dir.as_ref().map(PathBuf::from));
    let mut sink: Box<dyn Sink> = match &output_dir {
        Some(dir) => {
            let run_id = run_id();
            Box::new(
                CsvSink::new(dir, &run_id, cfg.logging.log_interval_sec, cfg.logging.log_events)
                    .wrap_err_with(|| format!("open CSV sink at {dir:?}"))?,
            )
        }
        None => Box::new(NullSink),
    };

    let mut observer: Box<dyn Observer> = if overrides.no_viz {
        Box::new(NullObserver)
    } else {
        Box::new(TerminalObserver::default())
    };

    let params = RunParams {
        duration_sec: overrides.duration.unwrap_or(cfg.simulation.duration_sec),
        time_scale: overrides.time_scale.unwrap_or(cfg.simulation.time_scale),
        update_interval_ms: cfg.simulation.update_interval_ms,
    };

    let clock = MonotonicClock::new();
    let summary = driver.run(&clock, sink.as_mut(), observer.as_mut(), params, &shutdown);
    Ok(summary)
}

fn run_id() -> String {
    format!("{:08x}", std::process::id())
}
