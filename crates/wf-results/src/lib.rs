//! wf-results: step timeline aggregation and report storage.

pub mod hash;
pub mod series;
pub mod store;
pub mod timeline;
pub mod types;

pub use hash::compute_report_id;
pub use series::{Series, UnitSystem, series_csv, series_csv_in};
pub use store::ReportStore;
pub use timeline::{Timeline, TimelineIndex, TimelinePoint, TimelineSegment};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Report not found: {report_id}")]
    ReportNotFound { report_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },

    #[error("Corrupt report {report_id}: {what}")]
    Corrupt { report_id: String, what: String },

    #[error("Unknown series: {name}")]
    UnknownSeries { name: String },
}
