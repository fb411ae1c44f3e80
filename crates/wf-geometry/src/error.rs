//! Error types for geometry construction and queries.

use thiserror::Error;

/// Errors raised while building or querying well geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Missing geometry: {what}")]
    MissingGeometry { what: &'static str },

    #[error("Invalid section '{name}': {reason}")]
    InvalidSection { name: String, reason: String },

    #[error("Non-monotonic geometry: {what}")]
    NonMonotonic { what: String },

    #[error("Depth {md} m outside geometry range (limit {limit} m)")]
    OutOfRange { md: f64, limit: f64 },
}

pub type GeometryResult<T> = Result<T, GeometryError>;

impl From<GeometryError> for wf_core::WfError {
    fn from(e: GeometryError) -> Self {
        match e {
            GeometryError::MissingGeometry { what } => wf_core::WfError::InvalidArg { what },
            _ => wf_core::WfError::InvalidArg {
                what: "invalid geometry",
            },
        }
    }
}
