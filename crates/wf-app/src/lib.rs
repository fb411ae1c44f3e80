//! Shared application service layer for wellflow.
//!
//! Front ends go through this crate for project management, operation
//! sequencing, report caching and background runs.

pub mod error;
pub mod progress;
pub mod project_service;
pub mod query;
pub mod run_service;
pub mod runtime_compile;
pub mod sequencer;
pub mod worker;

pub use error::{AppError, AppResult};
pub use progress::{OperationProgress, RunProgressEvent, RunStage};
pub use project_service::{
    OperationSummary, apply_preset, export_preset, import_presets, list_operations, load_project, save_preset,
    save_project, validate_project,
};
pub use query::{ReportSummary, extract_series, get_report_summary};
pub use run_service::{
    ENGINE_VERSION, RunOptions, RunRequest, RunResponse, RunTimingSummary, ensure_run,
    ensure_run_with_progress, list_reports, load_report,
};
pub use runtime_compile::{WellRuntime, compile_operation, compile_project};
pub use sequencer::{OperationStatus, SequencedOperation, Sequencer};
pub use worker::{RunWorker, WorkerMessage};
