//! Step records emitted by the engine.
//!
//! Every record carries a full [`WellboreState`] snapshot, so a record never
//! refers back into engine state and can be exported on its own.

use serde::{Deserialize, Serialize};
use wf_layers::{FloatState, WellboreState};

use crate::plan::OperationKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripOutStep {
    pub step: usize,
    /// Volume backfilled during this increment.
    pub backfill_m3: f64,
    pub cumulative_backfill_m3: f64,
    /// Mud pulled out of the well inside the pipe (float closed).
    pub cumulative_pulled_wet_m3: f64,
    pub swab_pa: f64,
    /// Target ESD reproduced with the solved back pressure.
    pub effective_esd_kg_m3: f64,
    pub cumulative_pit_gain_m3: f64,
    pub state: WellboreState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripInStep {
    pub step: usize,
    /// Closed-end displacement of this increment.
    pub displacement_m3: f64,
    pub cumulative_fill_m3: f64,
    pub cumulative_displacement_returns_m3: f64,
    pub surge_pa: f64,
    pub effective_esd_kg_m3: f64,
    pub cumulative_pit_gain_m3: f64,
    pub state: WellboreState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CirculationStep {
    pub step: usize,
    /// Index of the pump queue entry being pumped.
    pub queue_index: usize,
    pub pumped_m3: f64,
    pub cumulative_pumped_m3: f64,
    pub cumulative_returns_m3: f64,
    pub pump_rate_m3ps: f64,
    pub apl_pa: f64,
    /// Pumping time so far at the chosen rates.
    pub elapsed_s: f64,
    pub effective_esd_kg_m3: f64,
    pub cumulative_pit_gain_m3: f64,
    pub state: WellboreState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReamStep {
    pub step: usize,
    pub outward: bool,
    pub cumulative_backfill_m3: f64,
    pub cumulative_fill_m3: f64,
    pub cumulative_pumped_m3: f64,
    pub cumulative_returns_m3: f64,
    pub pump_rate_m3ps: f64,
    pub apl_pa: f64,
    pub swab_surge_pa: f64,
    pub effective_esd_kg_m3: f64,
    pub cumulative_pit_gain_m3: f64,
    pub state: WellboreState,
}

/// One increment of any operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StepRecord {
    TripOut(TripOutStep),
    TripIn(TripInStep),
    Circulation(CirculationStep),
    Ream(ReamStep),
}

impl StepRecord {
    pub fn step(&self) -> usize {
        match self {
            StepRecord::TripOut(r) => r.step,
            StepRecord::TripIn(r) => r.step,
            StepRecord::Circulation(r) => r.step,
            StepRecord::Ream(r) => r.step,
        }
    }

    pub fn state(&self) -> &WellboreState {
        match self {
            StepRecord::TripOut(r) => &r.state,
            StepRecord::TripIn(r) => &r.state,
            StepRecord::Circulation(r) => &r.state,
            StepRecord::Ream(r) => &r.state,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            StepRecord::TripOut(_) => OperationKind::TripOut,
            StepRecord::TripIn(_) => OperationKind::TripIn,
            StepRecord::Circulation(_) => OperationKind::Circulate,
            StepRecord::Ream(r) if r.outward => OperationKind::ReamOut,
            StepRecord::Ream(_) => OperationKind::ReamIn,
        }
    }

    pub fn bit_md(&self) -> f64 {
        self.state().bit_md
    }

    pub fn esd_at_control_kg_m3(&self) -> f64 {
        self.state().esd_at_control_kg_m3
    }

    pub fn sabp_pa(&self) -> f64 {
        self.state().sabp_pa
    }

    pub fn dynamic_sabp_pa(&self) -> f64 {
        self.state().dynamic_sabp_pa
    }

    pub fn float_state(&self) -> FloatState {
        self.state().float_state
    }

    pub fn effective_esd_kg_m3(&self) -> f64 {
        match self {
            StepRecord::TripOut(r) => r.effective_esd_kg_m3,
            StepRecord::TripIn(r) => r.effective_esd_kg_m3,
            StepRecord::Circulation(r) => r.effective_esd_kg_m3,
            StepRecord::Ream(r) => r.effective_esd_kg_m3,
        }
    }

    pub fn cumulative_pit_gain_m3(&self) -> f64 {
        match self {
            StepRecord::TripOut(r) => r.cumulative_pit_gain_m3,
            StepRecord::TripIn(r) => r.cumulative_pit_gain_m3,
            StepRecord::Circulation(r) => r.cumulative_pit_gain_m3,
            StepRecord::Ream(r) => r.cumulative_pit_gain_m3,
        }
    }

    /// Pump rate, zero for plain trips.
    pub fn pump_rate_m3ps(&self) -> f64 {
        match self {
            StepRecord::Circulation(r) => r.pump_rate_m3ps,
            StepRecord::Ream(r) => r.pump_rate_m3ps,
            _ => 0.0,
        }
    }

    pub fn apl_pa(&self) -> f64 {
        match self {
            StepRecord::Circulation(r) => r.apl_pa,
            StepRecord::Ream(r) => r.apl_pa,
            _ => 0.0,
        }
    }
}
