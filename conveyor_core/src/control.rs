//! The PLC scan: safety, jam detection, the state machine, the diverter
//! latch and the metrics accumulators. One [`ControlEngine::scan`] call is
//! one scan cycle; every decision inside it sees the same input snapshot.

use crate::tag::{Tag, TagTable};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SystemState {
    #[default]
    Stopped,
    Starting,
    Running,
    Fault,
}

impl SystemState {
    pub fn as_code(self) -> i64 {
        match self {
            SystemState::Stopped => 0,
            SystemState::Starting => 1,
            SystemState::Running => 2,
            SystemState::Fault => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultCode {
    #[default]
    None,
    Estop,
    JamInfeed,
    JamDiverter,
    JamOutfeedB,
    JamOutfeedC,
}

impl FaultCode {
    pub fn message(self) -> &'static str {
        match self {
            FaultCode::None => "",
            FaultCode::Estop => "EMERGENCY STOP ACTIVATED",
            FaultCode::JamInfeed => "JAM DETECTED AT INFEED (Station A)",
            FaultCode::JamDiverter => "JAM DETECTED AT DIVERTER",
            FaultCode::JamOutfeedB => "JAM DETECTED AT OUTFEED B (Station B)",
            FaultCode::JamOutfeedC => "JAM DETECTED AT OUTFEED C (Station C)",
        }
    }
}

/// The four photoeye sites jam detection and the jam latch track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JamSite {
    Infeed,
    Diverter,
    OutfeedB,
    OutfeedC,
}

impl JamSite {
    const ALL: [JamSite; 4] = [
        JamSite::Infeed,
        JamSite::Diverter,
        JamSite::OutfeedB,
        JamSite::OutfeedC,
    ];

    fn fault_code(self) -> FaultCode {
        match self {
            JamSite::Infeed => FaultCode::JamInfeed,
            JamSite::Diverter => FaultCode::JamDiverter,
            JamSite::OutfeedB => FaultCode::JamOutfeedB,
            JamSite::OutfeedC => FaultCode::JamOutfeedC,
        }
    }
}

impl fmt::Display for JamSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JamSite::Infeed => "infeed",
            JamSite::Diverter => "diverter",
            JamSite::OutfeedB => "outfeed_b",
            JamSite::OutfeedC => "outfeed_c",
        };
        f.write_str(s)
    }
}

/// Snapshot of the metrics accumulators, handed to sinks/observers once per
/// outer tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metrics {
    pub box_count: u64,
    pub jam_count: u64,
    pub avg_cycle_time_sec: f64,
    pub throughput_per_hour: f64,
}

const START_DELAY_SEC: f64 = 1.0;
const BLINK_PERIOD_SEC: f64 = 0.5;
const DIVERT_EVERY_NTH: u64 = 3;

/// All state owned by the control engine, kept out of the tag table (spec
/// §3 "Control state").
#[derive(Debug, Clone)]
pub struct ControlEngine {
    state: SystemState,
    fault_code: FaultCode,

    estop_latched: bool,
    prev_start: bool,
    prev_stop: bool,
    prev_fault_clear: bool,

    start_timer: f64,

    jam_timers: [f64; 4],
    jam_latched: bool,
    jam_location: Option<JamSite>,

    box_counter: u64,
    reject_next: bool,
    prev_infeed_pe: bool,
    prev_diverter_pe: bool,
    diverter_locked: bool,

    box_count: u64,
    jam_count: u64,
    cycle_active: bool,
    cycle_timer: f64,
    cycle_sum: f64,
    running_time: f64,
    fault_time: f64,
    prev_outfeed_b: bool,
    prev_outfeed_c: bool,
    prev_jam_latched: bool,

    blink_timer: f64,
    blink_on: bool,
}

impl Default for ControlEngine {
    fn default() -> Self {
        Self {
            state: SystemState::default(),
            fault_code: FaultCode::default(),
            estop_latched: false,
            prev_start: false,
            prev_stop: true,
            prev_fault_clear: false,
            start_timer: 0.0,
            jam_timers: [0.0; 4],
            jam_latched: false,
            jam_location: None,
            box_counter: 0,
            reject_next: false,
            prev_infeed_pe: false,
            prev_diverter_pe: false,
            diverter_locked: false,
            box_count: 0,
            jam_count: 0,
            cycle_active: false,
            cycle_timer: 0.0,
            cycle_sum: 0.0,
            running_time: 0.0,
            fault_time: 0.0,
            prev_outfeed_b: false,
            prev_outfeed_c: false,
            prev_jam_latched: false,
            blink_timer: 0.0,
            blink_on: false,
        }
    }
}

impl ControlEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    pub fn fault_code(&self) -> FaultCode {
        self.fault_code
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            box_count: self.box_count,
            jam_count: self.jam_count,
            avg_cycle_time_sec: self.avg_cycle_time(),
            throughput_per_hour: self.throughput(),
        }
    }

    fn avg_cycle_time(&self) -> f64 {
        if self.box_count == 0 {
            0.0
        } else {
            round2(self.cycle_sum / self.box_count as f64)
        }
    }

    fn throughput(&self) -> f64 {
        if self.running_time > 1.0 {
            round1(self.box_count as f64 / (self.running_time / 3600.0))
        } else {
            0.0
        }
    }

    fn jam_timer(&self, site: JamSite) -> f64 {
        self.jam_timers[jam_index(site)]
    }

    fn set_jam_timer(&mut self, site: JamSite, value: f64) {
        self.jam_timers[jam_index(site)] = value;
    }

    fn pe_blocked(site: JamSite, infeed: bool, diverter: bool, outfeed_b: bool, outfeed_c: bool) -> bool {
        match site {
            JamSite::Infeed => infeed,
            JamSite::Diverter => diverter,
            JamSite::OutfeedB => outfeed_b,
            JamSite::OutfeedC => outfeed_c,
        }
    }

    /// Execute one scan cycle of duration `dt` seconds against `tags`.
    pub fn scan(&mut self, tags: &mut TagTable, dt: f64) {
        // ---- read inputs ----
        let estop = tags.read_bool(Tag::EStop);
        let stop_pb = tags.read_bool(Tag::StopPb);
        let start_pb = tags.read_bool(Tag::StartPb) || tags.read_bool(Tag::HmiStart);
        let fault_clear = tags.read_bool(Tag::HmiFaultClear);
        let mode_manual = tags.read_bool(Tag::ModeSelector);
        let jog_fwd = tags.read_bool(Tag::HmiJogFwd);

        let infeed_pe = tags.read_bool(Tag::InfeedPe);
        let diverter_pe = tags.read_bool(Tag::DiverterPe);
        let outfeed_b_pe = tags.read_bool(Tag::OutfeedBPe);
        let outfeed_c_pe = tags.read_bool(Tag::OutfeedCPe);

        let jam_timeout = tags.read_real(Tag::JamTimeoutSec);

        // ---- edge detection ----
        let start_rising = start_pb && !self.prev_start;
        // bStopPB/bEStop are normally-closed: healthy = true, so "pressed"
        // is the falling edge, never the raw negated level.
        let stop_falling = self.prev_stop && !stop_pb;
        let clear_rising = fault_clear && !self.prev_fault_clear;

        // ---- blink timer ----
        self.blink_timer += dt;
        if self.blink_timer >= BLINK_PERIOD_SEC {
            self.blink_timer = 0.0;
            self.blink_on = !self.blink_on;
        }

        // ==============================================================
        // 1. SAFETY
        // ==============================================================
        if !estop {
            self.estop_latched = true;
            self.fault_code = FaultCode::Estop;
        }
        if self.estop_latched && clear_rising && estop {
            self.estop_latched = false;
            if !self.jam_latched {
                self.fault_code = FaultCode::None;
            }
        }
        let mut fault_active = self.estop_latched || self.jam_latched;
        let safe_to_run = estop && !self.estop_latched && !self.jam_latched && stop_pb;
        let start_cmd = start_rising && safe_to_run;

        // ==============================================================
        // 2. JAM DETECTION
        // ==============================================================
        if self.state == SystemState::Running || self.jam_latched {
            for site in JamSite::ALL {
                let blocked = Self::pe_blocked(site, infeed_pe, diverter_pe, outfeed_b_pe, outfeed_c_pe);
                if blocked && self.state == SystemState::Running {
                    self.set_jam_timer(site, self.jam_timer(site) + dt);
                } else {
                    self.set_jam_timer(site, 0.0);
                }
                if self.jam_timer(site) >= jam_timeout && !self.jam_latched {
                    self.jam_latched = true;
                    self.jam_location = Some(site);
                    self.fault_code = site.fault_code();
                    tracing::info!(site = %site, "jam detected");
                }
            }
        } else {
            self.jam_timers = [0.0; 4];
        }

        if self.jam_latched && clear_rising {
            let pe_clear = self.jam_location.map(|site| {
                !Self::pe_blocked(site, infeed_pe, diverter_pe, outfeed_b_pe, outfeed_c_pe)
            });
            if pe_clear == Some(true) {
                self.jam_latched = false;
                self.jam_location = None;
                if !self.estop_latched {
                    self.fault_code = FaultCode::None;
                }
            }
        }

        fault_active = self.estop_latched || self.jam_latched;

        // ==============================================================
        // 3. STATE MACHINE
        // ==============================================================
        let mut motor_cmd = false;
        let mut diverter_out = false;
        let mut alarm = false;
        let mut green = false;
        let mut red = false;
        let prev_state = self.state;

        match self.state {
            SystemState::Stopped => {
                if start_cmd {
                    self.state = SystemState::Starting;
                    self.start_timer = 0.0;
                    tracing::info!("STOPPED -> STARTING");
                }
            }
            SystemState::Starting => {
                green = self.blink_on;
                self.start_timer += dt;
                if fault_active {
                    self.state = SystemState::Fault;
                    tracing::info!("STARTING -> FAULT");
                } else if self.start_timer >= START_DELAY_SEC && safe_to_run {
                    self.state = SystemState::Running;
                    tracing::info!("STARTING -> RUNNING");
                }
            }
            SystemState::Running => {
                green = true;
                motor_cmd = if !mode_manual {
                    true
                } else {
                    jog_fwd && safe_to_run
                };
                if fault_active {
                    self.state = SystemState::Fault;
                    motor_cmd = false;
                    tracing::info!("RUNNING -> FAULT");
                } else if stop_falling || tags.read_bool(Tag::HmiStop) {
                    self.state = SystemState::Stopped;
                    motor_cmd = false;
                    tracing::info!("RUNNING -> STOPPED");
                }
            }
            SystemState::Fault => {
                red = self.blink_on;
                alarm = true;
                if !fault_active {
                    self.state = SystemState::Stopped;
                    tracing::info!("FAULT -> STOPPED");
                }
            }
        }

        // Leaving RUNNING must not leave the diverter latch stuck (spec §9).
        if prev_state == SystemState::Running && self.state != SystemState::Running {
            self.diverter_locked = false;
            self.reject_next = false;
        }

        // ==============================================================
        // 4. DIVERTER (auto mode, RUNNING only)
        // ==============================================================
        let infeed_rising = infeed_pe && !self.prev_infeed_pe;
        let diverter_rising = diverter_pe && !self.prev_diverter_pe;
        let diverter_falling = !diverter_pe && self.prev_diverter_pe;

        if self.state == SystemState::Running && !mode_manual {
            if infeed_rising {
                self.box_counter += 1;
                self.reject_next = self.box_counter % DIVERT_EVERY_NTH == 0;
            }
            if diverter_rising {
                self.diverter_locked = true;
                diverter_out = self.reject_next;
            }
            if self.diverter_locked {
                diverter_out = self.reject_next;
            }
            if diverter_falling && self.diverter_locked {
                self.diverter_locked = false;
                self.reject_next = false;
                diverter_out = false;
            }
        }

        // ==============================================================
        // 5. METRICS
        // ==============================================================
        let outfeed_b_rising = outfeed_b_pe && !self.prev_outfeed_b;
        let outfeed_c_rising = outfeed_c_pe && !self.prev_outfeed_c;
        let jam_rising = self.jam_latched && !self.prev_jam_latched;

        if infeed_rising && !self.cycle_active {
            self.cycle_active = true;
            self.cycle_timer = 0.0;
        }
        if self.cycle_active {
            self.cycle_timer += dt;
        }
        if self.cycle_active && (outfeed_b_rising || outfeed_c_rising) {
            self.box_count += 1;
            self.cycle_sum += self.cycle_timer;
            self.cycle_active = false;
            self.cycle_timer = 0.0;
        }
        if jam_rising {
            self.jam_count += 1;
        }
        if self.state == SystemState::Running {
            self.running_time += dt;
        }
        if self.state == SystemState::Fault {
            self.fault_time += dt;
        }

        // ==============================================================
        // 6. SAFETY-GATED MOTOR OUTPUT
        // ==============================================================
        let motor_output = motor_cmd && estop && !self.estop_latched && stop_pb;

        // ==============================================================
        // 7. WRITE OUTPUTS
        // ==============================================================
        tags.write_bool(Tag::ConveyorMotor, motor_output);
        tags.write_bool(Tag::DiverterActuator, diverter_out);
        tags.write_bool(Tag::AlarmBuzzer, alarm);
        tags.write_bool(Tag::StatusGreen, green);
        tags.write_bool(Tag::StatusRed, red);

        tags.write_int(Tag::HmiState, self.state.as_code());
        tags.write_string(Tag::HmiFaultMsg, self.fault_code.message());
        tags.write_int(Tag::HmiBoxCount, self.box_count as i64);
        tags.write_real(Tag::HmiAvgCycleTime, self.avg_cycle_time());
        tags.write_int(Tag::HmiJamCount, self.jam_count as i64);
        tags.write_real(Tag::HmiThroughput, self.throughput());

        // ---- save previous states ----
        self.prev_start = start_pb;
        self.prev_stop = stop_pb;
        self.prev_fault_clear = fault_clear;
        self.prev_infeed_pe = infeed_pe;
        self.prev_diverter_pe = diverter_pe;
        self.prev_outfeed_b = outfeed_b_pe;
        self.prev_outfeed_c = outfeed_c_pe;
        self.prev_jam_latched = self.jam_latched;

        // ---- consume one-shot HMI commands ----
        tags.write_bool(Tag::HmiStart, false);
        tags.write_bool(Tag::HmiStop, false);
        tags.write_bool(Tag::HmiFaultClear, false);
    }
}

fn jam_index(site: JamSite) -> usize {
    match site {
        JamSite::Infeed => 0,
        JamSite::Diverter => 1,
        JamSite::OutfeedB => 2,
        JamSite::OutfeedC => 3,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
