//! The outer run loop: wall-clock pacing, startup defaults, and pumping
//! events out to sinks and observers (spec §4.4).
//!
//! Generic over [`Clock`] so tests can drive it with an advance-on-sleep
//! test clock and assert on exact sim-time without a real sleep (mirrors the
//! teacher's `doser_core::runner` convention of taking the clock as a
//! parameter rather than reaching for `Instant::now()` directly).

use crate::box_model::ConveyorGeometry;
use crate::control::ControlEngine;
use crate::observer::{Observer, PhotoeyeSnapshot};
use crate::physics::{ArrivalCfg, EventKind, JamCfg, PhysicsEngine};
use crate::recovery::OperatorRecovery;
use crate::sink::Sink;
use crate::tag::{Tag, TagTable};
use conveyor_traits::Clock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    pub duration_sec: f64,
    pub time_scale: f64,
    pub update_interval_ms: u64,
}

/// Final box tally, handed to [`Sink::finalize`] and [`Observer::close`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: u64,
    pub accepted: u64,
    pub rejected: u64,
}

/// Writes the safe-state defaults a real PLC cold-boots into: E-stop and
/// stop pushbuttons healthy (`true`, NC convention), everything else idle.
pub fn write_safe_defaults(tags: &mut TagTable) {
    tags.write_bool(Tag::EStop, true);
    tags.write_bool(Tag::StopPb, true);
    tags.write_bool(Tag::StartPb, false);
    tags.write_bool(Tag::ModeSelector, false);
    tags.write_bool(Tag::InfeedPe, false);
    tags.write_bool(Tag::DiverterPe, false);
    tags.write_bool(Tag::OutfeedBPe, false);
    tags.write_bool(Tag::OutfeedCPe, false);
}

pub struct Driver {
    geometry: ConveyorGeometry,
    tags: TagTable,
    control: ControlEngine,
    physics: PhysicsEngine,
    recovery: OperatorRecovery,
}

impl Driver {
    pub fn new(geometry: ConveyorGeometry, arrivals: ArrivalCfg, jams: JamCfg, seed: u64) -> Self {
        let mut tags = TagTable::new();
        write_safe_defaults(&mut tags);
        Self {
            geometry,
            tags,
            control: ControlEngine::new(),
            physics: PhysicsEngine::new(geometry, arrivals, jams, seed),
            recovery: OperatorRecovery::new(),
        }
    }

    pub fn geometry(&self) -> ConveyorGeometry {
        self.geometry
    }

    /// Direct tag access for CLI-level overrides applied before `run`
    /// (e.g. `--jam-timeout`).
    pub fn tags_mut(&mut self) -> &mut TagTable {
        &mut self.tags
    }

    /// Run until `params.duration_sec` of simulated time has elapsed, the
    /// observer asks to stop, or `cancel` is set. Each outer tick maps wall
    /// time to simulated time via `sim_dt = real_dt * time_scale`, so a
    /// `time_scale` of 1.0 runs at real time and larger values run faster.
    pub fn run<C: Clock>(
        &mut self,
        clock: &C,
        sink: &mut dyn Sink,
        observer: &mut dyn Observer,
        params: RunParams,
        cancel: &AtomicBool,
    ) -> RunSummary {
        self.tags.write_bool(Tag::HmiStart, true);

        let sleep_ms = params.update_interval_ms;
        let mut last = clock.now();

        let mut summary = RunSummary::default();

        while self.physics.sim_time() < params.duration_sec
            && !cancel.load(Ordering::Relaxed)
            && observer.process_events()
        {
            let now = clock.now();
            let real_dt = clock.ms_since(last) as f64 / 1000.0;
            last = now;
            let sim_dt = real_dt * params.time_scale;

            let events = self.physics.update(&mut self.tags, &mut self.control, sim_dt);
            let recovery_events = self.recovery.tick(sim_dt, &mut self.tags, &mut self.control, &mut self.physics);

            for event in events.iter().chain(recovery_events.iter()) {
                match event.kind {
                    EventKind::BoxExitB => {
                        summary.total += 1;
                        summary.accepted += 1;
                    }
                    EventKind::BoxExitC => {
                        summary.total += 1;
                        summary.rejected += 1;
                    }
                    _ => {}
                }
                sink.log_event(event);
                observer.event(event);
            }

            let fault_msg = self.control.fault_code().message();
            sink.log_metrics(self.physics.sim_time(), self.control.state(), fault_msg, self.control.metrics());

            let photoeyes = PhotoeyeSnapshot {
                infeed: self.tags.read_bool(Tag::InfeedPe),
                diverter: self.tags.read_bool(Tag::DiverterPe),
                outfeed_b: self.tags.read_bool(Tag::OutfeedBPe),
                outfeed_c: self.tags.read_bool(Tag::OutfeedCPe),
            };
            observer.tick(
                self.physics.active_boxes(),
                self.control.state(),
                photoeyes,
                self.physics.sim_time(),
                self.control.metrics(),
            );

            clock.sleep(Duration::from_millis(sleep_ms));
        }

        sink.finalize(summary.total, summary.accepted, summary.rejected);
        observer.close(summary.total, summary.accepted, summary.rejected);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullSink;
    use std::cell::Cell;
    use std::time::Instant;

    /// Deterministic clock local to this crate's tests: `now()` is the
    /// origin plus an accumulated offset, `sleep()` advances that offset
    /// instead of actually blocking. Mirrors the shape of
    /// `conveyor_traits::clock`'s own `#[cfg(test)]` test clock, which is
    /// invisible from a downstream crate's test binary.
    struct TestClock {
        origin: Instant,
        offset: Cell<Duration>,
    }

    impl TestClock {
        fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset: Cell::new(Duration::ZERO),
            }
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.origin + self.offset.get()
        }

        fn sleep(&self, d: Duration) {
            self.offset.set(self.offset.get() + d);
        }
    }

    fn params() -> RunParams {
        RunParams {
            duration_sec: 2.0,
            time_scale: 1000.0,
            update_interval_ms: 50,
        }
    }

    #[test]
    fn run_stops_at_duration() {
        let geometry = ConveyorGeometry::from_spans(3000.0, 1500.0, 1000.0, 500.0, 200.0);
        let arrivals = ArrivalCfg {
            rate_per_hour: 3600.0,
            jitter_pct: 0.0,
        };
        let jams = JamCfg {
            enabled: false,
            probability_per_box: 0.0,
            location: None,
        };
        let mut driver = Driver::new(geometry, arrivals, jams, 1);
        let clock = TestClock::new();
        let cancel = AtomicBool::new(false);
        let mut sink = NullSink;
        let mut observer = crate::observer::NullObserver;

        let summary = driver.run(&clock, &mut sink, &mut observer, params(), &cancel);

        assert!(driver.physics.sim_time() >= 2.0);
        assert_eq!(summary.total, summary.accepted + summary.rejected);
    }

    #[test]
    fn run_honors_cancellation() {
        let geometry = ConveyorGeometry::from_spans(3000.0, 1500.0, 1000.0, 500.0, 200.0);
        let arrivals = ArrivalCfg {
            rate_per_hour: 0.0,
            jitter_pct: 0.0,
        };
        let jams = JamCfg {
            enabled: false,
            probability_per_box: 0.0,
            location: None,
        };
        let mut driver = Driver::new(geometry, arrivals, jams, 1);
        let clock = TestClock::new();
        let cancel = AtomicBool::new(true);
        let mut sink = NullSink;
        let mut observer = crate::observer::NullObserver;

        let long_run = RunParams {
            duration_sec: 900.0,
            time_scale: 1000.0,
            update_interval_ms: 50,
        };
        driver.run(&clock, &mut sink, &mut observer, long_run, &cancel);

        assert!(driver.physics.sim_time() < 900.0);
    }

    #[test]
    fn safe_defaults_are_nc_healthy() {
        let mut tags = TagTable::new();
        write_safe_defaults(&mut tags);
        assert!(tags.read_bool(Tag::EStop));
        assert!(tags.read_bool(Tag::StopPb));
        assert!(!tags.read_bool(Tag::StartPb));
    }
}
