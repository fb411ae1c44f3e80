//! Report data types.

use serde::{Deserialize, Serialize};
use wf_sim::{OperationKind, StepRecord};

use crate::timeline::Timeline;

pub type ReportId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportManifest {
    pub report_id: ReportId,
    pub project_name: String,
    pub timestamp: String,
    pub engine_version: String,
    pub total_steps: usize,
    #[serde(default)]
    pub operations: Vec<OperationSummary>,
}

impl ReportManifest {
    /// Manifest for `timeline`, stamped with the current UTC time.
    pub fn new(
        report_id: ReportId,
        project_name: &str,
        engine_version: &str,
        timeline: &Timeline,
    ) -> Self {
        Self {
            report_id,
            project_name: project_name.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            engine_version: engine_version.to_string(),
            total_steps: timeline.len(),
            operations: timeline.summaries(),
        }
    }
}

/// Where one operation's records sit in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSummary {
    pub operation_id: String,
    pub label: String,
    pub kind: OperationKind,
    pub first_index: usize,
    pub step_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One line of `steps.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepLine {
    pub index: usize,
    pub operation_index: usize,
    pub record: StepRecord,
}
