//! The tag table: the sole shared mutable state between the control engine
//! and the physics engine.
//!
//! The reference system is a stringly-typed OPC-UA style dictionary. Here the
//! tag set is a closed enumeration and every value carries its own type, so a
//! name/type mismatch is caught at the call site instead of silently
//! coercing.

use std::collections::HashMap;
use std::fmt;

/// One entry in the closed tag set (see spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    // Inputs, written by physics.
    StartPb,
    StopPb,
    EStop,
    ModeSelector,
    InfeedPe,
    DiverterPe,
    OutfeedBPe,
    OutfeedCPe,
    // Outputs, written by control.
    ConveyorMotor,
    DiverterActuator,
    AlarmBuzzer,
    StatusGreen,
    StatusRed,
    // HMI commands, one-shot, consumed on scan.
    HmiStart,
    HmiStop,
    HmiFaultClear,
    HmiJogFwd,
    // Status, control -> HMI.
    HmiState,
    HmiFaultMsg,
    HmiBoxCount,
    HmiAvgCycleTime,
    HmiJamCount,
    HmiThroughput,
    // Parameters.
    JamTimeoutSec,
    ConveyorSpeed,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Tag {
    /// The wire/log name exactly as it appears in spec §6 and the original
    /// OPC-UA tag dictionary.
    pub fn name(self) -> &'static str {
        match self {
            Tag::StartPb => "bStartPB",
            Tag::StopPb => "bStopPB",
            Tag::EStop => "bEStop",
            Tag::ModeSelector => "bModeSelector",
            Tag::InfeedPe => "bInfeedPE",
            Tag::DiverterPe => "bDiverterPE",
            Tag::OutfeedBPe => "bOutfeedBPE",
            Tag::OutfeedCPe => "bOutfeedCPE",
            Tag::ConveyorMotor => "bConveyorMotor",
            Tag::DiverterActuator => "bDiverterActuator",
            Tag::AlarmBuzzer => "bAlarmBuzzer",
            Tag::StatusGreen => "bStatusGreen",
            Tag::StatusRed => "bStatusRed",
            Tag::HmiStart => "bHMI_Start",
            Tag::HmiStop => "bHMI_Stop",
            Tag::HmiFaultClear => "bHMI_FaultClear",
            Tag::HmiJogFwd => "bHMI_JogFwd",
            Tag::HmiState => "iHMI_State",
            Tag::HmiFaultMsg => "sHMI_FaultMsg",
            Tag::HmiBoxCount => "rHMI_BoxCount",
            Tag::HmiAvgCycleTime => "rHMI_AvgCycleTime",
            Tag::HmiJamCount => "rHMI_JamCount",
            Tag::HmiThroughput => "rHMI_Throughput",
            Tag::JamTimeoutSec => "rJamTimeoutSec",
            Tag::ConveyorSpeed => "rConveyorSpeed",
        }
    }

    /// Default value read back for a tag that was never written.
    fn default_value(self) -> TagValue {
        match self {
            Tag::JamTimeoutSec => TagValue::Real(4.0),
            Tag::ConveyorSpeed => TagValue::Real(1.0),
            Tag::HmiState => TagValue::Int(0),
            Tag::HmiFaultMsg => TagValue::Str(String::new()),
            Tag::HmiBoxCount | Tag::HmiJamCount => TagValue::Int(0),
            Tag::HmiAvgCycleTime | Tag::HmiThroughput => TagValue::Real(0.0),
            Tag::StopPb | Tag::EStop => TagValue::Bool(true),
            _ => TagValue::Bool(false),
        }
    }

    fn value_kind(self) -> ValueKind {
        self.default_value().kind()
    }
}

/// A scalar value carried by a tag. The discriminant mirrors the four wire
/// types of the original OPC-UA dictionary (bool / int / real / string).
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Bool,
    Int,
    Real,
    Str,
}

impl TagValue {
    fn kind(&self) -> ValueKind {
        match self {
            TagValue::Bool(_) => ValueKind::Bool,
            TagValue::Int(_) => ValueKind::Int,
            TagValue::Real(_) => ValueKind::Real,
            TagValue::Str(_) => ValueKind::Str,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            TagValue::Bool(b) => *b,
            other => panic!("tag value {other:?} is not a bool"),
        }
    }

    pub fn as_int(&self) -> i64 {
        match self {
            TagValue::Int(i) => *i,
            other => panic!("tag value {other:?} is not an int"),
        }
    }

    pub fn as_real(&self) -> f64 {
        match self {
            TagValue::Real(r) => *r,
            other => panic!("tag value {other:?} is not a real"),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TagValue::Str(s) => s,
            other => panic!("tag value {other:?} is not a string"),
        }
    }
}

/// Error surfaced by a misuse of the tag table. Per spec §7 these are
/// programmer faults: an unknown name is impossible by construction (`Tag`
/// is a closed enum), so the only remaining way to hit this is a type
/// mismatch between the write and a prior read's assumed type.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TagError {
    #[error("tag {tag} expects a {expected:?} value, got {actual:?}")]
    TypeMismatch {
        tag: Tag,
        expected: &'static str,
        actual: TagValue,
    },
}

/// The flat tag table. Single-threaded; writes are visible to all
/// subsequent reads within the same thread (spec §5).
#[derive(Debug, Default, Clone)]
pub struct TagTable {
    values: HashMap<Tag, TagValue>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a tag, returning the documented default if never written.
    pub fn read(&self, tag: Tag) -> TagValue {
        self.values
            .get(&tag)
            .cloned()
            .unwrap_or_else(|| tag.default_value())
    }

    pub fn read_bool(&self, tag: Tag) -> bool {
        self.read(tag).as_bool()
    }

    pub fn read_int(&self, tag: Tag) -> i64 {
        self.read(tag).as_int()
    }

    pub fn read_real(&self, tag: Tag) -> f64 {
        self.read(tag).as_real()
    }

    pub fn read_string(&self, tag: Tag) -> String {
        self.read(tag).as_str().to_string()
    }

    /// Write a tag. Returns `TagError::TypeMismatch` if `value`'s
    /// discriminant doesn't match the tag's declared type.
    pub fn write(&mut self, tag: Tag, value: TagValue) -> Result<(), TagError> {
        if value.kind() != tag.value_kind() {
            return Err(TagError::TypeMismatch {
                tag,
                expected: kind_name(tag.value_kind()),
                actual: value,
            });
        }
        self.values.insert(tag, value);
        Ok(())
    }

    pub fn write_bool(&mut self, tag: Tag, value: bool) {
        self.write(tag, TagValue::Bool(value))
            .expect("bool tag type mismatch is a programmer fault");
    }

    pub fn write_int(&mut self, tag: Tag, value: i64) {
        self.write(tag, TagValue::Int(value))
            .expect("int tag type mismatch is a programmer fault");
    }

    pub fn write_real(&mut self, tag: Tag, value: f64) {
        self.write(tag, TagValue::Real(value))
            .expect("real tag type mismatch is a programmer fault");
    }

    pub fn write_string(&mut self, tag: Tag, value: impl Into<String>) {
        self.write(tag, TagValue::Str(value.into()))
            .expect("string tag type mismatch is a programmer fault");
    }
}

fn kind_name(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Bool => "bool",
        ValueKind::Int => "int",
        ValueKind::Real => "real",
        ValueKind::Str => "string",
    }
}
