//! Configuration error type (spec §7 "Configuration errors").

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("conveyor.{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: String },

    #[error(
        "conveyor geometry is inconsistent: infeed (0) <= diverter ({diverter_mm}) <= outfeed ({outfeed_mm}) <= total ({total_mm}), and box_length ({box_length_mm}) must be < diverter"
    )]
    InvalidGeometry {
        diverter_mm: String,
        outfeed_mm: String,
        total_mm: String,
        box_length_mm: String,
    },

    #[error("boxes.arrival_jitter_pct must be within [0, 100], got {0}")]
    InvalidJitterPct(String),

    #[error("jams.probability_per_box must be within [0, 1], got {0}")]
    InvalidProbability(String),

    #[error("simulation.duration_sec must be positive, got {0}")]
    InvalidDuration(String),

    #[error("simulation.time_scale must be positive, got {0}")]
    InvalidTimeScale(String),

    #[error("simulation.update_interval_ms must be nonzero")]
    ZeroUpdateInterval,

    #[error("logging.log_interval_sec must be positive, got {0}")]
    InvalidLogInterval(String),
}
