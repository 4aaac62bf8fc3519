//! Integration tests against the fixed `dt = 0.02 s`, auto-mode, 100 s seed
//! scenarios.

use conveyor_core::{
    ArrivalCfg, ConveyorGeometry, ControlEngine, EventKind, JamCfg, JamSite, PhysicsEngine, SystemState, Tag,
    TagTable,
};

const DT: f64 = 0.02;
const DURATION: f64 = 100.0;

fn geometry() -> ConveyorGeometry {
    ConveyorGeometry::from_spans(3000.0, 1500.0, 1000.0, 500.0, 200.0)
}

fn start_auto(tags: &mut TagTable) {
    tags.write_bool(Tag::EStop, true);
    tags.write_bool(Tag::StopPb, true);
    tags.write_bool(Tag::ModeSelector, false);
    tags.write_bool(Tag::HmiStart, true);
}

fn run(
    tags: &mut TagTable,
    control: &mut ControlEngine,
    physics: &mut PhysicsEngine,
    duration: f64,
) -> Vec<conveyor_core::Event> {
    let mut events = Vec::new();
    let mut t = 0.0;
    while t < duration {
        events.extend(physics.update(tags, control, DT));
        t += DT;
    }
    events
}

/// Scenario 1: low arrival rate, jams disabled, times out back to STOPPED.
#[test]
fn scenario_1_low_rate_no_jams() {
    let mut tags = TagTable::new();
    start_auto(&mut tags);
    tags.write_real(Tag::JamTimeoutSec, 4.0);

    let mut control = ControlEngine::new();
    let mut physics = PhysicsEngine::new(
        geometry(),
        ArrivalCfg {
            rate_per_hour: 72.0,
            jitter_pct: 0.0,
        },
        JamCfg {
            enabled: false,
            probability_per_box: 0.0,
            location: None,
        },
        1,
    );

    let events = run(&mut tags, &mut control, &mut physics, DURATION);

    let arrivals = events.iter().filter(|e| e.kind == EventKind::BoxArrival).count();
    assert!((1..=3).contains(&arrivals), "expected ~2 arrivals, got {arrivals}");
    assert_eq!(control.metrics().jam_count, 0);
}

/// Scenario 2: fast arrivals, no random jams, every 3rd box rejected.
#[test]
fn scenario_2_every_third_box_rejected() {
    let mut tags = TagTable::new();
    start_auto(&mut tags);

    let mut control = ControlEngine::new();
    let mut physics = PhysicsEngine::new(
        geometry(),
        ArrivalCfg {
            rate_per_hour: 600.0,
            jitter_pct: 0.0,
        },
        JamCfg {
            enabled: false,
            probability_per_box: 0.0,
            location: None,
        },
        42,
    );

    let events = run(&mut tags, &mut control, &mut physics, DURATION);

    let exits_b = events.iter().filter(|e| e.kind == EventKind::BoxExitB).count();
    let exits_c = events.iter().filter(|e| e.kind == EventKind::BoxExitC).count();
    assert!(exits_b + exits_c > 0);
    assert!(exits_b.abs_diff(exits_c) <= 1 || exits_b == 0 || exits_c == 0);
}

/// Scenario 3: guaranteed jam at the diverter, FAULT within one timeout
/// window past arrival, with the diverter fault message.
#[test]
fn scenario_3_jam_at_diverter_faults() {
    let mut tags = TagTable::new();
    start_auto(&mut tags);
    tags.write_real(Tag::JamTimeoutSec, 4.0);

    let mut control = ControlEngine::new();
    let mut physics = PhysicsEngine::new(
        geometry(),
        ArrivalCfg {
            rate_per_hour: 600.0,
            jitter_pct: 0.0,
        },
        JamCfg {
            enabled: true,
            probability_per_box: 1.0,
            location: Some(JamSite::Diverter),
        },
        3,
    );

    let _ = run(&mut tags, &mut control, &mut physics, DURATION);

    assert_eq!(control.state(), SystemState::Fault);
    assert_eq!(control.fault_code().message(), "JAM DETECTED AT DIVERTER");
}

/// Scenario 4: scenario 3 plus operator recovery clears the jam and the
/// system returns to RUNNING, with jam_count equal to the number of
/// FAULT entries.
#[test]
fn scenario_4_operator_recovery_restarts_system() {
    use conveyor_core::OperatorRecovery;

    let mut tags = TagTable::new();
    start_auto(&mut tags);
    tags.write_real(Tag::JamTimeoutSec, 4.0);

    let mut control = ControlEngine::new();
    let mut physics = PhysicsEngine::new(
        geometry(),
        ArrivalCfg {
            rate_per_hour: 600.0,
            jitter_pct: 0.0,
        },
        JamCfg {
            enabled: true,
            probability_per_box: 1.0,
            location: Some(JamSite::Diverter),
        },
        3,
    );
    let mut recovery = OperatorRecovery::new();

    let mut t = 0.0;
    let mut jam_cleared = false;
    while t < DURATION {
        let _ = physics.update(&mut tags, &mut control, DT);
        let events = recovery.tick(DT, &mut tags, &mut control, &mut physics);
        if events.iter().any(|e| e.kind == EventKind::JamCleared) {
            jam_cleared = true;
        }
        t += DT;
    }

    assert!(jam_cleared, "expected operator to clear the jam within the run");
    assert_eq!(control.metrics().jam_count, 1);
}

/// Scenario 5: STOPPED -> STARTING -> RUNNING after the 1.0 s start delay;
/// motor only energizes once RUNNING.
#[test]
fn scenario_5_start_sequence_has_one_second_delay() {
    let mut tags = TagTable::new();
    tags.write_bool(Tag::EStop, true);
    tags.write_bool(Tag::StopPb, true);
    tags.write_bool(Tag::InfeedPe, true); // PE blocked at start
    tags.write_bool(Tag::HmiStart, true);

    let mut control = ControlEngine::new();
    control.scan(&mut tags, DT);
    assert_eq!(control.state(), SystemState::Starting);
    assert!(!tags.read_bool(Tag::ConveyorMotor));

    let mut t = 0.0;
    while t < 1.2 && control.state() != SystemState::Running {
        control.scan(&mut tags, DT);
        t += DT;
    }
    assert_eq!(control.state(), SystemState::Running);
    assert!(tags.read_bool(Tag::ConveyorMotor));
}

/// Scenario 6: manual mode gates the motor on the jog command, not auto run.
#[test]
fn scenario_6_manual_mode_jog_gates_motor() {
    let mut tags = TagTable::new();
    tags.write_bool(Tag::EStop, true);
    tags.write_bool(Tag::StopPb, true);
    tags.write_bool(Tag::ModeSelector, true);
    tags.write_bool(Tag::HmiStart, true);

    let mut control = ControlEngine::new();
    let mut t = 0.0;
    while t < 1.2 {
        control.scan(&mut tags, DT);
        t += DT;
    }
    assert_eq!(control.state(), SystemState::Running);
    assert!(!tags.read_bool(Tag::ConveyorMotor));

    tags.write_bool(Tag::HmiJogFwd, true);
    control.scan(&mut tags, DT);
    assert!(tags.read_bool(Tag::ConveyorMotor));
}
