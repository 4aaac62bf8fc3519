use assert_cmd::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let toml = r#"
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
fn json_mode_emits_a_single_parseable_object() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("conveyor-sim").unwrap();
    cmd.arg("--config").arg(&cfg).arg("--json").arg("run").arg("--no-viz");
    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let line = stdout.lines().last().expect("expected at least one stdout line");
    let value: serde_json::Value = serde_json::from_str(line).expect("stdout line must be valid JSON");

    assert!(value.get("total").is_some());
    assert!(value.get("accepted").is_some());
    assert!(value.get("rejected").is_some());
}
