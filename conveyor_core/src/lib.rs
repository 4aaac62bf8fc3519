//! Deterministic, tick-driven co-simulation of a packaging conveyor under
//! PLC control: a physics engine and a control engine advancing in lockstep
//! over a shared tag table.

pub mod box_model;
pub mod control;
pub mod driver;
pub mod error;
pub mod observer;
pub mod physics;
pub mod recovery;
pub mod sink;
pub mod tag;

pub use box_model::{Box, BoxState, ConveyorGeometry};
pub use control::{ControlEngine, FaultCode, JamSite, Metrics, SystemState};
pub use driver::{Driver, RunParams, RunSummary};
pub use error::SimError;
pub use observer::{NullObserver, Observer, PhotoeyeSnapshot, TerminalObserver};
pub use physics::{ArrivalCfg, Event, EventKind, JamCfg, PhysicsEngine};
pub use recovery::OperatorRecovery;
pub use sink::{CsvSink, NullSink, Sink, SinkError};
pub use tag::{Tag, TagError, TagTable, TagValue};
