//! Simulated operator response to a jam fault (spec §4.3 step 6 / §9).
//!
//! Deliberately kept outside [`crate::control::ControlEngine`]: the PLC
//! itself never clears its own faults, an operator does. This collaborator
//! only ever injects HMI command tags into the tag table, the same channel
//! a real operator's panel would use.

use crate::control::{ControlEngine, SystemState};
use crate::physics::{Event, PhysicsEngine};
use crate::tag::{Tag, TagTable};

/// Simulated time an operator takes to notice a fault and clear the jam.
pub const RECOVERY_DELAY_SEC: f64 = 3.0;

/// Tracks how long the system has been faulted and, once the delay has
/// elapsed, removes the jammed box and pulses the fault-clear/start tags.
#[derive(Debug, Default)]
pub struct OperatorRecovery {
    recovering: bool,
    timer: f64,
}

impl OperatorRecovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call once per outer tick, after `physics.update()`. Returns any
    /// `JAM_CLEARED` events produced by removing the jammed box.
    pub fn tick(
        &mut self,
        dt: f64,
        tags: &mut TagTable,
        control: &mut ControlEngine,
        physics: &mut PhysicsEngine,
    ) -> Vec<Event> {
        if control.state() == SystemState::Fault && !self.recovering {
            self.recovering = true;
            self.timer = 0.0;
        }

        if !self.recovering {
            return Vec::new();
        }

        self.timer += dt;
        if self.timer < RECOVERY_DELAY_SEC {
            return Vec::new();
        }

        let events = physics.clear_jams();
        physics.write_photoeyes(tags);
        tags.write_bool(Tag::HmiFaultClear, true);
        control.scan(tags, 0.0);

        self.recovering = false;
        self.timer = 0.0;

        if control.state() == SystemState::Stopped {
            tags.write_bool(Tag::HmiStart, true);
        }

        events
    }
}
