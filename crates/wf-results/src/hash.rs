//! Content-based hashing for report IDs.

use sha2::{Digest, Sha256};
use wf_project::schema::Project;

/// Hash of the project inputs and engine version; identical inputs give the
/// same report id.
pub fn compute_report_id(project: &Project, engine_version: &str) -> String {
    let mut hasher = Sha256::new();

    let project_json = serde_json::to_string(project).unwrap_or_default();
    hasher.update(project_json.as_bytes());

    hasher.update(engine_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_project::schema::*;

    fn project(density: f64) -> Project {
        Project {
            version: 1,
            name: "hash".to_string(),
            well: WellDef {
                hole: vec![HoleSectionDef {
                    name: "hole".to_string(),
                    top_md: 0.0,
                    bottom_md: 1000.0,
                    diameter_m: 0.2,
                    cased: false,
                }],
                pipe: vec![PipeSectionDef {
                    name: "dp".to_string(),
                    top_md: 0.0,
                    bottom_md: 1000.0,
                    od_m: 0.127,
                    id_m: 0.1,
                }],
                survey: vec![],
            },
            muds: vec![MudDef {
                id: "m".to_string(),
                name: "M".to_string(),
                density_kg_m3: density,
                color: None,
            }],
            initial: InitialStateDef {
                bit_md: 1000.0,
                mud_id: "m".to_string(),
                float: FloatStateDef::NotInstalled,
                string_layers: vec![],
                annulus_layers: vec![],
            },
            operations: vec![],
            models: ModelsDef::default(),
            presets: vec![],
        }
    }

    #[test]
    fn hash_stability() {
        let p = project(1200.0);
        assert_eq!(compute_report_id(&p, "v1"), compute_report_id(&p, "v1"));
        assert_eq!(compute_report_id(&p, "v1").len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        assert_ne!(
            compute_report_id(&project(1200.0), "v1"),
            compute_report_id(&project(1250.0), "v1")
        );
        assert_ne!(
            compute_report_id(&project(1200.0), "v1"),
            compute_report_id(&project(1200.0), "v2")
        );
    }
}
