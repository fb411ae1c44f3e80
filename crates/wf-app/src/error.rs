//! Error types for the wf-app service layer.

use std::path::PathBuf;

use wf_sim::ErrorKind;

/// Application error type that wraps errors from the backend crates
/// and gives CLI and worker front ends one error interface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read project file: {path}")]
    ProjectFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Runtime compilation failed: {0}")]
    Compile(String),

    #[error("Simulation error ({kind}): {message}")]
    Simulation { kind: ErrorKind, message: String },

    #[error("Results error: {0}")]
    Results(String),

    #[error("Operation index {index} out of range ({len} operations)")]
    OperationIndex { index: usize, len: usize },

    #[error("No initial wellbore state; call bootstrap first")]
    NotBootstrapped,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for wf-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<wf_project::ProjectError> for AppError {
    fn from(err: wf_project::ProjectError) -> Self {
        match err {
            wf_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<wf_project::ValidationError> for AppError {
    fn from(err: wf_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<wf_sim::SimError> for AppError {
    fn from(err: wf_sim::SimError) -> Self {
        AppError::Simulation {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<wf_geometry::GeometryError> for AppError {
    fn from(err: wf_geometry::GeometryError) -> Self {
        AppError::Compile(err.to_string())
    }
}

impl From<wf_layers::LayerError> for AppError {
    fn from(err: wf_layers::LayerError) -> Self {
        AppError::Compile(err.to_string())
    }
}

impl From<wf_results::ResultsError> for AppError {
    fn from(err: wf_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
