//! Error types for the step engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while running one operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Missing geometry: {what}")]
    MissingGeometry { what: String },

    #[error("Unresolved mud '{id}' ({role})")]
    UnresolvedMud { id: String, role: &'static str },

    #[error("Invalid range: {reason}")]
    InvalidRange { reason: String },

    #[error("Pump queue exhausted after {pumped_m3:.3} m3, {required_m3:.3} m3 required")]
    QueueExhaustedEarly { pumped_m3: f64, required_m3: f64 },

    #[error("Back-pressure solve did not converge at MD {control_md} m")]
    NonConvergentBackPressureSolve { control_md: f64 },

    #[error("Cancelled")]
    Cancelled,

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Layer model error: {0}")]
    Layer(#[from] wf_layers::LayerError),
}

pub type SimResult<T> = Result<T, SimError>;

impl From<wf_geometry::GeometryError> for SimError {
    fn from(e: wf_geometry::GeometryError) -> Self {
        SimError::MissingGeometry {
            what: e.to_string(),
        }
    }
}

impl From<wf_core::WfError> for SimError {
    fn from(e: wf_core::WfError) -> Self {
        SimError::Layer(wf_layers::LayerError::Numeric(e))
    }
}

/// Error category stored on an operation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    MissingGeometry,
    UnresolvedMud,
    InvalidRange,
    QueueExhaustedEarly,
    NonConvergentBackPressureSolve,
    Cancelled,
    InvalidArg,
    Numerical,
}

impl SimError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimError::MissingGeometry { .. } => ErrorKind::MissingGeometry,
            SimError::UnresolvedMud { .. } => ErrorKind::UnresolvedMud,
            SimError::InvalidRange { .. } => ErrorKind::InvalidRange,
            SimError::QueueExhaustedEarly { .. } => ErrorKind::QueueExhaustedEarly,
            SimError::NonConvergentBackPressureSolve { .. } => {
                ErrorKind::NonConvergentBackPressureSolve
            }
            SimError::Cancelled => ErrorKind::Cancelled,
            SimError::InvalidArg { .. } => ErrorKind::InvalidArg,
            SimError::Layer(_) => ErrorKind::Numerical,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorKind::MissingGeometry => "missing geometry",
            ErrorKind::UnresolvedMud => "unresolved mud",
            ErrorKind::InvalidRange => "invalid range",
            ErrorKind::QueueExhaustedEarly => "queue exhausted early",
            ErrorKind::NonConvergentBackPressureSolve => "back-pressure solve failed",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::InvalidArg => "invalid argument",
            ErrorKind::Numerical => "numerical error",
        };
        f.write_str(text)
    }
}
