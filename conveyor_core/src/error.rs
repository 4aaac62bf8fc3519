//! Simulation-level errors (spec §7). Config and tag errors already have
//! their own types; this enum covers the things that can go wrong wiring a
//! run together.

use crate::sink::SinkError;
use crate::tag::TagError;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] conveyor_config::ConfigError),

    #[error("tag table error: {0}")]
    Tag(#[from] TagError),

    #[error("sink setup failed: {0}")]
    Sink(#[from] SinkError),
}
