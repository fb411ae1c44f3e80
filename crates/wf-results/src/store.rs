//! Report storage API.
//!
//! Each report lives in `<root>/<report_id>/` as `manifest.json` plus one
//! JSON step record per line in `steps.jsonl`.

use crate::timeline::{Timeline, TimelineSegment};
use crate::types::{ReportManifest, StepLine};
use crate::{ResultsError, ResultsResult};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct ReportStore {
    root_dir: PathBuf,
}

impl ReportStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store beside a project file, under `.wellflow/reports`.
    pub fn for_project(project_path: &Path) -> ResultsResult<Self> {
        let project_dir = project_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "project path has no parent directory".to_string(),
            })?;
        Self::new(project_dir.join(".wellflow").join("reports"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn report_dir(&self, report_id: &str) -> PathBuf {
        self.root_dir.join(report_id)
    }

    pub fn has_report(&self, report_id: &str) -> bool {
        self.report_dir(report_id).join("manifest.json").exists()
    }

    pub fn save_report(&self, manifest: &ReportManifest, timeline: &Timeline) -> ResultsResult<()> {
        let report_dir = self.report_dir(&manifest.report_id);
        fs::create_dir_all(&report_dir)?;

        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(report_dir.join("manifest.json"), manifest_json)?;

        let mut steps = String::new();
        for point in timeline.points() {
            let line = StepLine {
                index: point.index,
                operation_index: point.operation,
                record: point.record.clone(),
            };
            steps.push_str(&serde_json::to_string(&line)?);
            steps.push('\n');
        }
        fs::write(report_dir.join("steps.jsonl"), steps)?;

        Ok(())
    }

    pub fn load_manifest(&self, report_id: &str) -> ResultsResult<ReportManifest> {
        let manifest_path = self.report_dir(report_id).join("manifest.json");

        if !manifest_path.exists() {
            return Err(ResultsError::ReportNotFound {
                report_id: report_id.to_string(),
            });
        }

        let content = fs::read_to_string(manifest_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_steps(&self, report_id: &str) -> ResultsResult<Vec<StepLine>> {
        let steps_path = self.report_dir(report_id).join("steps.jsonl");

        if !steps_path.exists() {
            return Err(ResultsError::ReportNotFound {
                report_id: report_id.to_string(),
            });
        }

        let content = fs::read_to_string(steps_path)?;
        let mut lines = Vec::new();
        for line in content.lines() {
            if !line.trim().is_empty() {
                lines.push(serde_json::from_str(line)?);
            }
        }
        Ok(lines)
    }

    /// Rebuild the timeline from the manifest and the step lines.
    pub fn load_timeline(&self, report_id: &str) -> ResultsResult<(ReportManifest, Timeline)> {
        let manifest = self.load_manifest(report_id)?;
        let mut segments: Vec<TimelineSegment> = manifest
            .operations
            .iter()
            .map(|op| TimelineSegment {
                operation_id: op.operation_id.clone(),
                label: op.label.clone(),
                kind: op.kind,
                records: Vec::with_capacity(op.step_count),
                error: op.error.clone(),
            })
            .collect();

        for line in self.load_steps(report_id)? {
            let segment = segments.get_mut(line.operation_index).ok_or_else(|| {
                ResultsError::Corrupt {
                    report_id: report_id.to_string(),
                    what: format!("step {} names operation {}", line.index, line.operation_index),
                }
            })?;
            segment.records.push(line.record);
        }

        let timeline = Timeline::from_segments(segments);
        if timeline.len() != manifest.total_steps {
            return Err(ResultsError::Corrupt {
                report_id: report_id.to_string(),
                what: format!(
                    "manifest lists {} steps, found {}",
                    manifest.total_steps,
                    timeline.len()
                ),
            });
        }
        Ok((manifest, timeline))
    }

    pub fn list_reports(&self, project_name: &str) -> ResultsResult<Vec<ReportManifest>> {
        let mut reports = Vec::new();

        if !self.root_dir.exists() {
            return Ok(reports);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let report_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&report_id)
                    && manifest.project_name == project_name
                {
                    reports.push(manifest);
                }
            }
        }

        reports.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(reports)
    }

    pub fn delete_report(&self, report_id: &str) -> ResultsResult<()> {
        let report_dir = self.report_dir(report_id);
        if report_dir.exists() {
            fs::remove_dir_all(report_dir)?;
        }
        Ok(())
    }
}
