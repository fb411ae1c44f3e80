//! Operation step engine for wellflow.
//!
//! Runs one configured operation (trip out, trip in, circulate, ream out,
//! ream in) against an incoming [`wf_layers::WellboreState`], advancing the
//! bit or the pumped volume in increments and emitting a [`StepRecord`] per
//! increment:
//! - trip mechanics with backfill, fill and displacement returns
//! - float valve state machine with U-tube equalization
//! - surface back-pressure solve for a target ESD at the control depth
//! - pluggable swab/surge and annular pressure loss models
//! - progress callback and cancellation between steps

pub mod backpressure;
pub mod circulate;
pub mod engine;
pub mod error;
pub mod float;
pub mod models;
pub mod plan;
pub mod progress;
pub mod record;
pub mod trip;

pub use backpressure::{BackPressure, solve_back_pressure};
pub use engine::{OperationFailure, OperationRun, SimContext, run_operation};
pub use error::{ErrorKind, SimError, SimResult};
pub use float::{UTubeOutcome, float_differential_pa, update_float};
pub use models::{
    AnnularPressureLossModel, AplContext, LinearApl, ModelSet, ProportionalSwabSurge,
    SwabSurgeContext, SwabSurgeModel, TabulatedApl,
};
pub use plan::{
    BackfillPolicy, Calibration, FloatConfig, MudSelection, OperationKind, OperationPlan,
    PumpEntry, PumpQueue, PumpRateConfig,
};
pub use progress::{CancelToken, StepProgress};
pub use record::{CirculationStep, ReamStep, StepRecord, TripInStep, TripOutStep};
