//! Project loading, saving, validation, presets and introspection.

use std::path::Path;
use wf_project::schema::{OperationDef, Project};

use crate::error::{AppError, AppResult};
use crate::runtime_compile::compile_kind;

/// One operation for listing.
#[derive(Debug, Clone)]
pub struct OperationSummary {
    pub id: String,
    pub label: String,
    pub kind: String,
    pub start_md: Option<f64>,
    pub end_md: f64,
}

/// Load a project file (YAML, or JSON by extension), migrated and validated.
pub fn load_project(path: &Path) -> AppResult<Project> {
    if !path.exists() {
        return Err(AppError::ProjectFileRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }
    Ok(wf_project::load_project(path)?)
}

pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    Ok(wf_project::save_project(path, project)?)
}

pub fn validate_project(project: &Project) -> AppResult<()> {
    wf_project::validate_project(project)?;
    if project.operations.is_empty() {
        return Err(AppError::Validation(
            "Project must have at least one operation".to_string(),
        ));
    }
    Ok(())
}

pub fn list_operations(project: &Project) -> Vec<OperationSummary> {
    project.operations.iter().map(summarize).collect()
}

fn summarize(op: &OperationDef) -> OperationSummary {
    OperationSummary {
        id: op.id.clone(),
        label: op.label.clone(),
        kind: compile_kind(op.kind).to_string(),
        start_md: op.start_md,
        end_md: op.end_md,
    }
}

/// Store the project's operation list as a preset and save the project.
pub fn save_preset(project_path: &Path, name: &str) -> AppResult<Project> {
    let mut project = load_project(project_path)?;
    project.save_preset(name);
    save_project(project_path, &project)?;
    Ok(project)
}

/// Write one preset from the project to a stand-alone file.
pub fn export_preset(project: &Project, name: &str, output: &Path) -> AppResult<()> {
    let preset = project
        .preset(name)
        .ok_or_else(|| AppError::InvalidInput(format!("Preset not found: {}", name)))?;
    Ok(wf_project::save_presets(output, std::slice::from_ref(preset))?)
}

/// Merge presets from a file into the project and save it.
pub fn import_presets(project_path: &Path, presets_path: &Path) -> AppResult<Project> {
    let mut project = load_project(project_path)?;
    let presets = wf_project::load_presets(presets_path)?;
    wf_project::import_presets(&mut project, presets)?;
    save_project(project_path, &project)?;
    Ok(project)
}

/// Append a preset's operations to the project and save it. Returns the
/// number of operations added.
pub fn apply_preset(project_path: &Path, name: &str) -> AppResult<usize> {
    let mut project = load_project(project_path)?;
    let added = wf_project::apply_preset(&mut project, name)?;
    save_project(project_path, &project)?;
    Ok(added)
}
