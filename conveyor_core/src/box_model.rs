//! The box entity and conveyor geometry (spec §3).

use crate::control::JamSite;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxState {
    Queued,
    AtInfeed,
    AtDiverter,
    AtOutfeedB,
    AtOutfeedC,
    Completed,
    Jammed,
}

/// A single box on the belt.
#[derive(Debug, Clone)]
pub struct Box {
    pub box_id: u64,
    pub position_mm: f64,
    pub state: BoxState,
    pub arrival_time: f64,
    pub exit_time: Option<f64>,
    pub is_reject: bool,
    pub is_jammed: bool,
    pub routed: bool,
    /// Pre-assigned at creation; only consulted once `is_jammed` is true
    /// (spec §9 "jam location pre-assignment").
    pub jam_location: JamSite,
    /// The exact belt position at which this box will jam, if `is_jammed`.
    jam_trigger_pos_mm: f64,
}

impl Box {
    pub fn new(
        box_id: u64,
        arrival_time: f64,
        is_jammed: bool,
        jam_location: JamSite,
        jam_trigger_pos_mm: f64,
    ) -> Self {
        Self {
            box_id,
            position_mm: 0.0,
            state: BoxState::AtInfeed,
            arrival_time,
            exit_time: None,
            is_reject: false,
            is_jammed,
            routed: false,
            jam_location,
            jam_trigger_pos_mm,
        }
    }

    /// Whether `self` would cross its pre-assigned jam trigger position if
    /// advanced to `next_pos_mm`.
    pub fn crosses_jam_trigger(&self, next_pos_mm: f64) -> bool {
        self.is_jammed
            && self.state != BoxState::Jammed
            && next_pos_mm >= self.jam_trigger_pos_mm
    }

    /// Whether this box's body overlaps a photoeye at `pe_pos_mm`.
    pub fn occupies(&self, pe_pos_mm: f64, box_length_mm: f64) -> bool {
        let half = box_length_mm / 2.0;
        (self.position_mm - half) <= pe_pos_mm && pe_pos_mm <= (self.position_mm + half)
    }
}

/// Immutable belt layout (spec §3 "Conveyor geometry").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConveyorGeometry {
    pub total_length_mm: f64,
    pub infeed_pe_pos_mm: f64,
    pub diverter_pe_pos_mm: f64,
    pub outfeed_b_pos_mm: f64,
    pub outfeed_c_pos_mm: f64,
    pub belt_speed_mms: f64,
    pub box_length_mm: f64,
}

impl ConveyorGeometry {
    /// Build geometry from the two config-facing span lengths (spec §6:
    /// `infeed_to_diverter_mm`, `diverter_to_outfeed_mm`).
    pub fn from_spans(
        total_length_mm: f64,
        infeed_to_diverter_mm: f64,
        diverter_to_outfeed_mm: f64,
        belt_speed_mms: f64,
        box_length_mm: f64,
    ) -> Self {
        let diverter_pe_pos_mm = infeed_to_diverter_mm;
        let outfeed_pos_mm = diverter_pe_pos_mm + diverter_to_outfeed_mm;
        Self {
            total_length_mm,
            infeed_pe_pos_mm: 0.0,
            diverter_pe_pos_mm,
            outfeed_b_pos_mm: outfeed_pos_mm,
            outfeed_c_pos_mm: outfeed_pos_mm,
            belt_speed_mms,
            box_length_mm,
        }
    }

    pub fn is_geometrically_valid(&self) -> bool {
        self.infeed_pe_pos_mm == 0.0
            && self.infeed_pe_pos_mm <= self.diverter_pe_pos_mm
            && self.diverter_pe_pos_mm <= self.outfeed_b_pos_mm
            && self.outfeed_b_pos_mm == self.outfeed_c_pos_mm
            && self.box_length_mm < self.diverter_pe_pos_mm
            && self.outfeed_b_pos_mm <= self.total_length_mm
    }
}
