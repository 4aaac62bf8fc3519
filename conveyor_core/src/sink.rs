//! Metrics and event persistence (spec §4.5). [`Sink`] is the seam between
//! the simulation and durable storage; [`CsvSink`] is the one real
//! implementation, [`NullSink`] the no-op used when logging is disabled.

use crate::control::{Metrics, SystemState};
use crate::physics::Event;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("flush failed: {0}")]
    Flush(#[from] std::io::Error),
}

/// Where periodic metrics snapshots and box lifecycle events are recorded.
pub trait Sink {
    fn log_metrics(&mut self, sim_time: f64, state: SystemState, fault_msg: &str, metrics: Metrics);
    fn log_event(&mut self, event: &Event);
    /// Called once at shutdown; `total`/`accepted`/`rejected` describe the
    /// completed-box tally for the SUMMARY event.
    fn finalize(&mut self, total: u64, accepted: u64, rejected: u64);
}

/// Discards everything. Used when `logging.output_dir` is unset.
#[derive(Debug, Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn log_metrics(&mut self, _sim_time: f64, _state: SystemState, _fault_msg: &str, _metrics: Metrics) {}
    fn log_event(&mut self, _event: &Event) {}
    fn finalize(&mut self, _total: u64, _accepted: u64, _rejected: u64) {}
}

/// Writes `metrics_<run_id>.csv` and, if enabled, `events_<run_id>.csv`
/// under `output_dir`. Metrics rows are rate-limited to `log_interval_sec`;
/// event rows are written immediately and flushed per row so a crash loses
/// at most the in-flight write.
pub struct CsvSink {
    metrics_writer: csv::Writer<std::fs::File>,
    events_writer: Option<csv::Writer<std::fs::File>>,
    log_interval_sec: f64,
    last_log_time: f64,
}

impl CsvSink {
    pub fn new(output_dir: &Path, run_id: &str, log_interval_sec: f64, log_events: bool) -> Result<Self, SinkError> {
        std::fs::create_dir_all(output_dir).map_err(|source| SinkError::CreateDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let metrics_path = output_dir.join(format!("metrics_{run_id}.csv"));
        let metrics_file = std::fs::File::create(&metrics_path).map_err(|source| SinkError::OpenFile {
            path: metrics_path.clone(),
            source,
        })?;
        let mut metrics_writer = csv::Writer::from_writer(metrics_file);
        metrics_writer.write_record([
            "sim_time_sec",
            "system_state",
            "box_count",
            "avg_cycle_time_sec",
            "jam_count",
            "throughput_per_hour",
            "fault_message",
        ])?;
        metrics_writer.flush()?;

        let events_writer = if log_events {
            let events_path = output_dir.join(format!("events_{run_id}.csv"));
            let events_file = std::fs::File::create(&events_path).map_err(|source| SinkError::OpenFile {
                path: events_path.clone(),
                source,
            })?;
            let mut w = csv::Writer::from_writer(events_file);
            w.write_record(["sim_time_sec", "event_type", "box_id", "description"])?;
            w.flush()?;
            Some(w)
        } else {
            None
        };

        Ok(Self {
            metrics_writer,
            events_writer,
            log_interval_sec,
            last_log_time: f64::NEG_INFINITY,
        })
    }
}

impl Sink for CsvSink {
    fn log_metrics(&mut self, sim_time: f64, state: SystemState, fault_msg: &str, metrics: Metrics) {
        if sim_time - self.last_log_time < self.log_interval_sec {
            return;
        }
        self.last_log_time = sim_time;

        let _ = self.metrics_writer.write_record([
            format!("{sim_time:.2}"),
            state.as_code().to_string(),
            metrics.box_count.to_string(),
            format!("{:.2}", metrics.avg_cycle_time_sec),
            metrics.jam_count.to_string(),
            format!("{:.1}", metrics.throughput_per_hour),
            fault_msg.to_string(),
        ]);
        let _ = self.metrics_writer.flush();
    }

    fn log_event(&mut self, event: &Event) {
        let Some(writer) = self.events_writer.as_mut() else {
            return;
        };
        let _ = writer.write_record([
            format!("{:.2}", event.sim_time),
            event.kind.as_str().to_string(),
            event.box_id.to_string(),
            event.detail.clone(),
        ]);
        let _ = writer.flush();
    }

    fn finalize(&mut self, total: u64, accepted: u64, rejected: u64) {
        let Some(writer) = self.events_writer.as_mut() else {
            return;
        };
        let _ = writer.write_record([
            "0.00".to_string(),
            "SUMMARY".to_string(),
            "0".to_string(),
            format!("Total processed: {total}, Accept: {accepted}, Reject: {rejected}"),
        ]);
        let _ = writer.flush();
    }
}
