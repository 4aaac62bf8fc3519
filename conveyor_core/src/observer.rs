//! Console progress reporting (spec §4.5). Separate from [`crate::sink::Sink`]
//! because it is interactive status, not durable records: it is fine to drop
//! when stdout isn't a terminal anyone is watching.

use crate::box_model::Box;
use crate::control::{Metrics, SystemState};
use crate::physics::Event;

/// Read-only snapshot of the four photoeyes, handed to an observer alongside
/// the active box list so it can render without touching the tag table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhotoeyeSnapshot {
    pub infeed: bool,
    pub diverter: bool,
    pub outfeed_b: bool,
    pub outfeed_c: bool,
}

pub trait Observer {
    /// Called once per outer tick with a read-only view of sim state.
    /// Observers must not mutate the tag table or box list.
    fn tick(&mut self, boxes: &[Box], plc_state: SystemState, photoeyes: PhotoeyeSnapshot, sim_time: f64, metrics: Metrics);
    fn event(&mut self, event: &Event);
    /// Polled once per outer tick; `false` requests the driver shut down,
    /// the second cancellation pathway alongside the host-level `AtomicBool`.
    fn process_events(&mut self) -> bool;
    fn close(&mut self, total: u64, accepted: u64, rejected: u64);
}

#[derive(Debug, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn tick(&mut self, _boxes: &[Box], _plc_state: SystemState, _photoeyes: PhotoeyeSnapshot, _sim_time: f64, _metrics: Metrics) {}
    fn event(&mut self, _event: &Event) {}
    fn process_events(&mut self) -> bool {
        true
    }
    fn close(&mut self, _total: u64, _accepted: u64, _rejected: u64) {}
}

/// Prints a one-line status update and every event to stderr, in the
/// teacher's `eprintln!`-summary style.
#[derive(Debug, Default)]
pub struct TerminalObserver {
    lines_written: u64,
}

impl Observer for TerminalObserver {
    fn tick(&mut self, boxes: &[Box], plc_state: SystemState, photoeyes: PhotoeyeSnapshot, sim_time: f64, metrics: Metrics) {
        self.lines_written += 1;
        eprintln!(
            "t={sim_time:>8.1}s state={plc_state:?} active={:<4} pe=[{}{}{}{}] boxes={:<5} jams={:<3} avg_cycle={:>6.2}s throughput={:>7.1}/hr",
            boxes.len(),
            if photoeyes.infeed { 'I' } else { '.' },
            if photoeyes.diverter { 'D' } else { '.' },
            if photoeyes.outfeed_b { 'B' } else { '.' },
            if photoeyes.outfeed_c { 'C' } else { '.' },
            metrics.box_count,
            metrics.jam_count,
            metrics.avg_cycle_time_sec,
            metrics.throughput_per_hour
        );
    }

    fn event(&mut self, event: &Event) {
        eprintln!("  [{:>8.2}] {} box={} {}", event.sim_time, event.kind.as_str(), event.box_id, event.detail);
    }

    fn process_events(&mut self) -> bool {
        true
    }

    fn close(&mut self, total: u64, accepted: u64, rejected: u64) {
        eprintln!("\n--- Run Summary ---");
        eprintln!("Total processed: {total}");
        eprintln!("Accepted: {accepted}");
        eprintln!("Rejected: {rejected}");
        eprintln!("-------------------\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_observer_ignores_everything() {
        let mut obs = NullObserver;
        obs.tick(&[], SystemState::Running, PhotoeyeSnapshot::default(), 1.0, Metrics::default());
        assert!(obs.process_events());
        obs.close(0, 0, 0);
    }

    #[test]
    fn terminal_observer_counts_ticks() {
        let mut obs = TerminalObserver::default();
        obs.tick(&[], SystemState::Running, PhotoeyeSnapshot::default(), 1.0, Metrics::default());
        obs.tick(&[], SystemState::Running, PhotoeyeSnapshot::default(), 2.0, Metrics::default());
        assert_eq!(obs.lines_written, 2);
        assert!(obs.process_events());
    }
}
