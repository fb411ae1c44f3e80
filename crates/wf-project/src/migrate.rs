//! Schema migration framework.

use crate::ProjectError;
use crate::schema::{OperationDef, Project};

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut project: Project) -> Result<Project, ProjectError> {
    while project.version < LATEST_VERSION {
        project = migrate_one_version(project)?;
    }
    Ok(project)
}

fn migrate_one_version(project: Project) -> Result<Project, ProjectError> {
    match project.version {
        0 => migrate_v0_to_v1(project),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 0 files carried blank operation ids.
fn migrate_v0_to_v1(mut project: Project) -> Result<Project, ProjectError> {
    assign_missing_ids(&mut project.operations);
    for preset in &mut project.presets {
        assign_missing_ids(&mut preset.operations);
    }
    project.version = 1;
    Ok(project)
}

fn assign_missing_ids(operations: &mut [OperationDef]) {
    for op in operations {
        if op.id.trim().is_empty() {
            op.id = uuid::Uuid::new_v4().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;

    fn v0_project() -> Project {
        let mut op = OperationDef::new("pull", OperationKindDef::TripOut, 1000.0, 100.0, "wbm");
        op.id = String::new();
        Project {
            version: 0,
            name: "old".to_string(),
            well: WellDef {
                hole: vec![HoleSectionDef {
                    name: "hole".to_string(),
                    top_md: 0.0,
                    bottom_md: 2000.0,
                    diameter_m: 0.2159,
                    cased: false,
                }],
                pipe: vec![PipeSectionDef {
                    name: "dp".to_string(),
                    top_md: 0.0,
                    bottom_md: 2000.0,
                    od_m: 0.127,
                    id_m: 0.1086,
                }],
                survey: vec![],
            },
            muds: vec![MudDef {
                id: "wbm".to_string(),
                name: "WBM".to_string(),
                density_kg_m3: 1200.0,
                color: None,
            }],
            initial: InitialStateDef {
                bit_md: 2000.0,
                mud_id: "wbm".to_string(),
                float: FloatStateDef::NotInstalled,
                string_layers: vec![],
                annulus_layers: vec![],
            },
            operations: vec![op],
            models: ModelsDef::default(),
            presets: vec![],
        }
    }

    #[test]
    fn v0_gets_operation_ids() {
        let migrated = migrate_to_latest(v0_project()).unwrap();
        assert_eq!(migrated.version, LATEST_VERSION);
        assert!(!migrated.operations[0].id.is_empty());
    }

    #[test]
    fn latest_is_untouched() {
        let mut project = v0_project();
        project.version = LATEST_VERSION;
        project.operations[0].id = "keep".to_string();
        let migrated = migrate_to_latest(project.clone()).unwrap();
        assert_eq!(migrated, project);
    }
}
