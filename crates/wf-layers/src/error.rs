//! Error types for layer stack operations.

use crate::region::Region;
use thiserror::Error;
use wf_core::WfError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayerError {
    #[error("{region} underfilled by {deficit_m3:.6} m3")]
    Underfilled { region: Region, deficit_m3: f64 },

    #[error("{region} holds {available_m3:.6} m3, cannot remove {requested_m3:.6} m3")]
    InsufficientVolume {
        region: Region,
        available_m3: f64,
        requested_m3: f64,
    },

    #[error("Layer invariant violated in {region}: {what}")]
    Invariant { region: Region, what: String },

    #[error("Numeric error: {0}")]
    Numeric(#[from] WfError),
}

pub type LayerResult<T> = Result<T, LayerError>;
