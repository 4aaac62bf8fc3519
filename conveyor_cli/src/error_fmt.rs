//! Human-readable error descriptions and structured JSON error formatting.

use conveyor_config::ConfigError;
use conveyor_core::SimError;

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(ce) = err.downcast_ref::<ConfigError>() {
        return format!(
            "What happened: {ce}.\nLikely causes: a value in the config TOML is out of range or the geometry spans are inconsistent.\nHow to fix: edit the config and re-run, or run `validate-config` to iterate faster."
        );
    }

    if let Some(se) = err.downcast_ref::<SimError>() {
        return format!(
            "What happened: {se}.\nLikely causes: see logs.\nHow to fix: re-run with --log-level=debug for more detail."
        );
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("no such file") || lower.contains("os error 2") {
        return "What happened: the config file could not be read.\nLikely causes: wrong --config path.\nHow to fix: pass an existing TOML file with --config <path>.".to_string();
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!("Something went wrong.{cause}\nHow to fix: re-run with --log-level=debug for details. Original: {msg}")
}

/// Stable exit codes for known error categories; unrecognized errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<ConfigError>().is_some() {
        return 2;
    }
    if err.downcast_ref::<SimError>().is_some() {
        return 3;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = if err.downcast_ref::<ConfigError>().is_some() {
        "ConfigError"
    } else if err.downcast_ref::<SimError>().is_some() {
        "SimError"
    } else {
        "Error"
    };

    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
