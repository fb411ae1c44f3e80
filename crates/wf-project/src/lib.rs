//! wf-project: canonical project file format, presets and validation.

pub mod migrate;
pub mod schema;
pub mod validate;

pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use schema::*;
pub use validate::{ValidationError, validate_project};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("Preset not found: {name}")]
    PresetNotFound { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<Project> {
    let content = std::fs::read_to_string(path)?;
    let mut project: Project = serde_yaml::from_str(&content)?;
    project = migrate_to_latest(project)?;
    validate_project(&project)?;
    Ok(project)
}

pub fn save_yaml(path: &std::path::Path, project: &Project) -> ProjectResult<()> {
    validate_project(project)?;
    let content = serde_yaml::to_string(project)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<Project> {
    let content = std::fs::read_to_string(path)?;
    let mut project: Project = serde_json::from_str(&content)?;
    project = migrate_to_latest(project)?;
    validate_project(&project)?;
    Ok(project)
}

pub fn save_json(path: &std::path::Path, project: &Project) -> ProjectResult<()> {
    validate_project(project)?;
    let content = serde_json::to_string_pretty(project)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load a project, picking the format from the file extension.
pub fn load_project(path: &std::path::Path) -> ProjectResult<Project> {
    if is_json(path) {
        load_json(path)
    } else {
        load_yaml(path)
    }
}

pub fn save_project(path: &std::path::Path, project: &Project) -> ProjectResult<()> {
    if is_json(path) {
        save_json(path, project)
    } else {
        save_yaml(path, project)
    }
}

/// Write presets to a stand-alone file (YAML, or JSON by extension).
pub fn save_presets(path: &std::path::Path, presets: &[PresetDef]) -> ProjectResult<()> {
    let file = PresetFile {
        version: LATEST_VERSION,
        presets: presets.to_vec(),
    };
    let content = if is_json(path) {
        serde_json::to_string_pretty(&file)?
    } else {
        serde_yaml::to_string(&file)?
    };
    std::fs::write(path, content)?;
    Ok(())
}

/// Read a stand-alone preset file.
///
/// Mud references are checked when the presets are merged into a project.
pub fn load_presets(path: &std::path::Path) -> ProjectResult<Vec<PresetDef>> {
    let content = std::fs::read_to_string(path)?;
    let file: PresetFile = if is_json(path) {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    if file.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: file.version,
        }
        .into());
    }
    Ok(file.presets)
}

/// Merge presets into a project (same name replaces) and validate the result.
pub fn import_presets(project: &mut Project, presets: Vec<PresetDef>) -> ProjectResult<()> {
    let mut merged = project.clone();
    for preset in presets {
        match merged.presets.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => merged.presets.push(preset),
        }
    }
    validate_project(&merged)?;
    *project = merged;
    Ok(())
}

/// Append a named preset's operations to the project.
pub fn apply_preset(project: &mut Project, name: &str) -> ProjectResult<usize> {
    project
        .apply_preset(name)
        .ok_or_else(|| ProjectError::PresetNotFound {
            name: name.to_string(),
        })
}

fn is_json(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}
