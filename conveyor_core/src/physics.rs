//! The physics engine: box arrivals, motion, jam triggering, routing and
//! photoeye occupancy (spec §4.3). Owns the active box list and the
//! seeded RNG; everything it decides is committed to the tag table before
//! the control engine's next scan.

use crate::box_model::{Box, BoxState, ConveyorGeometry};
use crate::control::{ControlEngine, JamSite};
use crate::tag::{Tag, TagTable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Physics sub-step ceiling; the outer driver tick is split into slices no
/// longer than this so fast boxes can't tunnel through a photoeye or jam
/// trigger between scans.
pub const MAX_PHYSICS_DT: f64 = 0.05;

/// Arrival scheduling parameters, bridged from [`conveyor_config::BoxesCfg`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalCfg {
    pub rate_per_hour: f64,
    pub jitter_pct: f64,
}

impl From<&conveyor_config::BoxesCfg> for ArrivalCfg {
    fn from(cfg: &conveyor_config::BoxesCfg) -> Self {
        Self {
            rate_per_hour: cfg.arrival_rate_per_hour,
            jitter_pct: cfg.arrival_jitter_pct,
        }
    }
}

/// Jam injection parameters, bridged from [`conveyor_config::JamsCfg`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JamCfg {
    pub enabled: bool,
    pub probability_per_box: f64,
    /// `None` means pick a site per box at random.
    pub location: Option<JamSite>,
}

impl From<&conveyor_config::JamsCfg> for JamCfg {
    fn from(cfg: &conveyor_config::JamsCfg) -> Self {
        use conveyor_config::JamLocationCfg as L;
        let location = match cfg.jam_location {
            L::Random => None,
            L::Infeed => Some(JamSite::Infeed),
            L::Diverter => Some(JamSite::Diverter),
            L::OutfeedB => Some(JamSite::OutfeedB),
            L::OutfeedC => Some(JamSite::OutfeedC),
        };
        Self {
            enabled: cfg.enabled,
            probability_per_box: cfg.probability_per_box,
            location,
        }
    }
}

/// A lifecycle event the driver forwards to sinks/observers.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub sim_time: f64,
    pub box_id: u64,
    pub kind: EventKind,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    BoxArrival,
    Jam,
    JamCleared,
    BoxExitB,
    BoxExitC,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::BoxArrival => "BOX_ARRIVAL",
            EventKind::Jam => "JAM",
            EventKind::JamCleared => "JAM_CLEARED",
            EventKind::BoxExitB => "BOX_EXIT_B",
            EventKind::BoxExitC => "BOX_EXIT_C",
        }
    }
}

/// Owns the belt state: active boxes, arrival scheduling and the seeded RNG.
/// The control engine is driven from here, once per sub-step, so physics and
/// control always see the same dt (spec §2 "scan-synchronous coupling").
#[derive(Debug)]
pub struct PhysicsEngine {
    geometry: ConveyorGeometry,
    arrivals: ArrivalCfg,
    jams: JamCfg,
    rng: StdRng,

    sim_time: f64,
    next_arrival_time: f64,
    next_box_id: u64,
    active: Vec<Box>,
}

impl PhysicsEngine {
    pub fn new(geometry: ConveyorGeometry, arrivals: ArrivalCfg, jams: JamCfg, seed: u64) -> Self {
        let mut engine = Self {
            geometry,
            arrivals,
            jams,
            rng: StdRng::seed_from_u64(seed),
            sim_time: 0.0,
            next_arrival_time: 0.0,
            next_box_id: 1,
            active: Vec::new(),
        };
        engine.schedule_next_arrival();
        engine
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn active_boxes(&self) -> &[Box] {
        &self.active
    }

    /// Advance the simulation by `dt_outer` seconds, sub-stepping at
    /// [`MAX_PHYSICS_DT`] and running one control scan per sub-step.
    /// Returns every lifecycle event emitted along the way.
    pub fn update(&mut self, tags: &mut TagTable, control: &mut ControlEngine, dt_outer: f64) -> Vec<Event> {
        let mut events = Vec::new();
        let mut remaining = dt_outer;
        while remaining > 1e-12 {
            let step = remaining.min(MAX_PHYSICS_DT);
            self.substep(tags, control, step, &mut events);
            remaining -= step;
        }
        events
    }

    fn substep(&mut self, tags: &mut TagTable, control: &mut ControlEngine, dt: f64, events: &mut Vec<Event>) {
        self.sim_time += dt;

        self.write_photoeyes(tags);
        control.scan(tags, dt);

        let motor_on = tags.read_bool(Tag::ConveyorMotor);
        let diverter_extended = tags.read_bool(Tag::DiverterActuator);
        let speed_setpoint = {
            let v = tags.read_real(Tag::ConveyorSpeed);
            if v == 0.0 { 1.0 } else { v }
        };

        if self.sim_time >= self.next_arrival_time {
            if control.state() == crate::control::SystemState::Running {
                self.generate_box(events);
            }
            self.schedule_next_arrival();
        }

        if motor_on {
            let speed = self.geometry.belt_speed_mms * speed_setpoint;
            self.move_boxes(dt, speed, diverter_extended, events);
        }
    }

    fn schedule_next_arrival(&mut self) {
        if self.arrivals.rate_per_hour <= 0.0 {
            self.next_arrival_time = f64::INFINITY;
            return;
        }
        let interval = 3600.0 / self.arrivals.rate_per_hour;
        let jitter = interval * (self.arrivals.jitter_pct / 100.0);
        let actual = if jitter > 0.0 {
            interval + self.rng.gen_range(-jitter..=jitter)
        } else {
            interval
        };
        self.next_arrival_time = self.sim_time + actual.max(1.0);
    }

    fn should_inject_jam(&mut self) -> bool {
        self.jams.enabled && self.rng.r#gen::<f64>() < self.jams.probability_per_box
    }

    fn jam_location(&mut self) -> JamSite {
        match self.jams.location {
            Some(site) => site,
            None => {
                const SITES: [JamSite; 4] = [
                    JamSite::Infeed,
                    JamSite::Diverter,
                    JamSite::OutfeedB,
                    JamSite::OutfeedC,
                ];
                SITES[self.rng.gen_range(0..SITES.len())]
            }
        }
    }

    fn jam_trigger_pos(&self, site: JamSite) -> f64 {
        match site {
            JamSite::Infeed => self.geometry.infeed_pe_pos_mm,
            JamSite::Diverter => self.geometry.diverter_pe_pos_mm,
            JamSite::OutfeedB => self.geometry.outfeed_b_pos_mm,
            JamSite::OutfeedC => self.geometry.outfeed_c_pos_mm,
        }
    }

    fn generate_box(&mut self, events: &mut Vec<Event>) {
        let box_id = self.next_box_id;
        self.next_box_id += 1;
        let is_jammed = self.should_inject_jam();
        let jam_location = self.jam_location();
        let jam_trigger_pos_mm = self.jam_trigger_pos(jam_location);

        let b = Box::new(box_id, self.sim_time, is_jammed, jam_location, jam_trigger_pos_mm);

        let detail = if is_jammed {
            format!("Box {box_id} arrived at infeed [WILL JAM]")
        } else {
            format!("Box {box_id} arrived at infeed")
        };
        events.push(Event {
            sim_time: self.sim_time,
            box_id,
            kind: EventKind::BoxArrival,
            detail,
        });

        self.active.push(b);
    }

    fn move_boxes(&mut self, dt: f64, speed_mms: f64, diverter_extended: bool, events: &mut Vec<Event>) {
        let distance = speed_mms * dt;
        let mut completed_ids = Vec::new();

        for b in self.active.iter_mut() {
            if b.state == BoxState::Jammed {
                continue;
            }

            let next_pos = b.position_mm + distance;
            if b.crosses_jam_trigger(next_pos) {
                b.state = BoxState::Jammed;
                events.push(Event {
                    sim_time: self.sim_time,
                    box_id: b.box_id,
                    kind: EventKind::Jam,
                    detail: format!("Box {} jammed at {}", b.box_id, b.jam_location),
                });
                continue;
            }

            b.position_mm = next_pos;

            if b.position_mm >= self.geometry.outfeed_b_pos_mm && !b.is_reject {
                b.state = BoxState::AtOutfeedB;
                if b.position_mm >= self.geometry.outfeed_b_pos_mm + self.geometry.box_length_mm {
                    b.state = BoxState::Completed;
                    b.exit_time = Some(self.sim_time);
                    let cycle = self.sim_time - b.arrival_time;
                    events.push(Event {
                        sim_time: self.sim_time,
                        box_id: b.box_id,
                        kind: EventKind::BoxExitB,
                        detail: format!(
                            "Box {} exited at Station B (accept), cycle={cycle:.1}s",
                            b.box_id
                        ),
                    });
                    completed_ids.push(b.box_id);
                }
            } else if b.position_mm >= self.geometry.outfeed_c_pos_mm && b.is_reject {
                b.state = BoxState::AtOutfeedC;
                if b.position_mm >= self.geometry.outfeed_c_pos_mm + self.geometry.box_length_mm {
                    b.state = BoxState::Completed;
                    b.exit_time = Some(self.sim_time);
                    let cycle = self.sim_time - b.arrival_time;
                    events.push(Event {
                        sim_time: self.sim_time,
                        box_id: b.box_id,
                        kind: EventKind::BoxExitC,
                        detail: format!(
                            "Box {} exited at Station C (reject), cycle={cycle:.1}s",
                            b.box_id
                        ),
                    });
                    completed_ids.push(b.box_id);
                }
            } else if b.position_mm >= self.geometry.diverter_pe_pos_mm {
                b.state = BoxState::AtDiverter;
                if !b.routed {
                    b.is_reject = diverter_extended;
                    b.routed = true;
                }
            } else if b.position_mm >= self.geometry.infeed_pe_pos_mm {
                b.state = BoxState::AtInfeed;
            }
        }

        if !completed_ids.is_empty() {
            self.active.retain(|b| !completed_ids.contains(&b.box_id));
        }
    }

    /// Remove every jammed box and report it as a `JamCleared` event
    /// (operator recovery owns deciding *when* to call this).
    pub fn clear_jams(&mut self) -> Vec<Event> {
        let sim_time = self.sim_time;
        let mut events = Vec::new();
        self.active.retain(|b| {
            if b.state == BoxState::Jammed {
                events.push(Event {
                    sim_time,
                    box_id: b.box_id,
                    kind: EventKind::JamCleared,
                    detail: format!("Box {} removed by operator", b.box_id),
                });
                false
            } else {
                true
            }
        });
        events
    }

    pub fn has_jammed_box(&self) -> bool {
        self.active.iter().any(|b| b.state == BoxState::Jammed)
    }

    /// Refresh the photoeye tags from current box positions without
    /// advancing the simulation. Used by operator recovery so the PLC sees
    /// a cleared infeed/diverter/outfeed before it processes the fault-clear
    /// command.
    pub(crate) fn write_photoeyes(&self, tags: &mut TagTable) {
        let box_len = self.geometry.box_length_mm;
        let mut infeed = false;
        let mut diverter = false;
        let mut outfeed_b = false;
        let mut outfeed_c = false;

        for b in &self.active {
            if b.occupies(self.geometry.infeed_pe_pos_mm, box_len) {
                infeed = true;
            }
            if b.occupies(self.geometry.diverter_pe_pos_mm, box_len) {
                diverter = true;
            }
            if !b.is_reject && b.occupies(self.geometry.outfeed_b_pos_mm, box_len) {
                outfeed_b = true;
            }
            if b.is_reject && b.occupies(self.geometry.outfeed_c_pos_mm, box_len) {
                outfeed_c = true;
            }
        }

        tags.write_bool(Tag::InfeedPe, infeed);
        tags.write_bool(Tag::DiverterPe, diverter);
        tags.write_bool(Tag::OutfeedBPe, outfeed_b);
        tags.write_bool(Tag::OutfeedCPe, outfeed_c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::TagTable;

    fn geometry() -> ConveyorGeometry {
        ConveyorGeometry::from_spans(3000.0, 1500.0, 1000.0, 500.0, 200.0)
    }

    fn no_jams() -> JamCfg {
        JamCfg {
            enabled: false,
            probability_per_box: 0.0,
            location: None,
        }
    }

    fn fast_arrivals() -> ArrivalCfg {
        ArrivalCfg {
            rate_per_hour: 3600.0,
            jitter_pct: 0.0,
        }
    }

    #[test]
    fn zero_rate_never_schedules_an_arrival() {
        let engine = PhysicsEngine::new(
            geometry(),
            ArrivalCfg {
                rate_per_hour: 0.0,
                jitter_pct: 0.0,
            },
            no_jams(),
            1,
        );
        assert_eq!(engine.next_arrival_time, f64::INFINITY);
    }

    #[test]
    fn box_arrives_and_moves_once_running() {
        let mut tags = TagTable::new();
        let mut control = ControlEngine::new();
        let mut physics = PhysicsEngine::new(geometry(), fast_arrivals(), no_jams(), 42);

        tags.write_bool(Tag::EStop, true);
        tags.write_bool(Tag::StopPb, true);
        tags.write_bool(Tag::HmiStart, true);

        let mut all_events = Vec::new();
        for _ in 0..40 {
            let events = physics.update(&mut tags, &mut control, 0.05);
            all_events.extend(events);
        }

        assert_eq!(control.state(), crate::control::SystemState::Running);
        assert!(all_events.iter().any(|e| e.kind == EventKind::BoxArrival));
    }

    #[test]
    fn accepted_box_exits_at_station_b() {
        let mut tags = TagTable::new();
        let mut control = ControlEngine::new();
        let mut physics = PhysicsEngine::new(geometry(), fast_arrivals(), no_jams(), 7);

        tags.write_bool(Tag::EStop, true);
        tags.write_bool(Tag::StopPb, true);
        tags.write_bool(Tag::HmiStart, true);

        let mut all_events = Vec::new();
        for _ in 0..1200 {
            let events = physics.update(&mut tags, &mut control, 0.05);
            all_events.extend(events);
        }

        assert!(all_events.iter().any(|e| e.kind == EventKind::BoxExitB));
    }

    #[test]
    fn clear_jams_removes_jammed_boxes_and_emits_events() {
        let mut physics = PhysicsEngine::new(geometry(), no_jams_no_arrivals(), no_jams(), 3);
        physics
            .active
            .push(Box::new(1, 0.0, true, JamSite::Infeed, 0.0));
        physics.active[0].state = BoxState::Jammed;

        let events = physics.clear_jams();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::JamCleared);
        assert!(physics.active_boxes().is_empty());
    }

    fn no_jams_no_arrivals() -> ArrivalCfg {
        ArrivalCfg {
            rate_per_hour: 0.0,
            jitter_pct: 0.0,
        }
    }
}
