use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[conveyor]
total_length_mm = 3000
infeed_to_diverter_mm = 1500
diverter_to_outfeed_mm = 1000
belt_speed_mms = 500
box_length_mm = 200

[boxes]
arrival_rate_per_hour = 3600
arrival_jitter_pct = 0

[jams]
enabled = false

[simulation]
duration_sec = 1.0
time_scale = 1000
update_interval_ms = 50
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[test]
fn help_prints_usage() {
    let mut cmd = Command::cargo_bin("conveyor-sim").unwrap();
    cmd.arg("--help");
    cmd.assert().success().stdout(predicate::str::contains("Usage:"));
}

#[test]
fn validate_config_accepts_a_well_formed_file() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("conveyor-sim").unwrap();
    cmd.arg("--config").arg(&cfg).arg("validate-config");
    cmd.assert().success().stdout(predicate::str::contains("is valid"));
}

#[test]
fn run_completes_a_short_simulation() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("conveyor-sim").unwrap();
    cmd.arg("--config").arg(&cfg).arg("run").arg("--no-viz");
    cmd.assert().success().stdout(predicate::str::contains("finished:"));
}

#[test]
fn rejects_invalid_geometry() {
    let dir = tempdir().unwrap();
    let toml = r#"
[conveyor]
infeed_to_diverter_mm = 0
box_length_mm = 500
"#;
    let path = dir.path().join("bad.toml");
    fs::write(&path, toml).unwrap();

    let mut cmd = Command::cargo_bin("conveyor-sim").unwrap();
    cmd.arg("--config").arg(&path).arg("validate-config");
    cmd.assert().failure().stderr(predicate::str::contains("geometry"));
}

#[test]
fn missing_config_file_reports_a_clear_error() {
    let mut cmd = Command::cargo_bin("conveyor-sim").unwrap();
    cmd.arg("--config").arg("/no/such/file.toml").arg("validate-config");
    cmd.assert().failure();
}
