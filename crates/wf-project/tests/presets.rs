use wf_project::schema::*;
use wf_project::*;

fn project() -> Project {
    let yaml = r#"
version: 1
name: presets
well:
  hole: [{ name: hole, top_md: 0.0, bottom_md: 2000.0, diameter_m: 0.2159 }]
  pipe: [{ name: dp, top_md: 0.0, bottom_md: 2000.0, od_m: 0.127, id_m: 0.1086 }]
muds:
  - { id: wbm, name: WBM, density_kg_m3: 1200.0 }
  - { id: heavy, name: Heavy, density_kg_m3: 1400.0 }
initial: { bit_md: 2000.0, mud_id: wbm }
operations:
  - { id: out, label: out, kind: TripOut, end_md: 1500.0, step_size_m: 100.0, muds: { base: wbm, backfill: heavy } }
  - { id: in, label: in, kind: TripIn, end_md: 2000.0, step_size_m: 100.0, muds: { base: wbm } }
"#;
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn save_and_apply_preset() {
    let mut project = project();
    project.save_preset("wiper");
    assert_eq!(project.presets.len(), 1);

    // Saving again under the same name replaces it.
    project.operations.pop();
    project.save_preset("wiper");
    assert_eq!(project.presets.len(), 1);
    assert_eq!(project.presets[0].operations.len(), 1);

    let added = apply_preset(&mut project, "wiper").unwrap();
    assert_eq!(added, 1);
    assert_eq!(project.operations.len(), 2);
    assert_ne!(project.operations[0].id, project.operations[1].id);
    assert_eq!(project.operations[0].label, project.operations[1].label);
    validate_project(&project).unwrap();

    assert!(matches!(
        apply_preset(&mut project, "nope"),
        Err(ProjectError::PresetNotFound { .. })
    ));
}

#[test]
fn preset_file_roundtrip() {
    let mut project = project();
    project.save_preset("wiper");
    let presets = project.presets.clone();

    for name in ["wf_presets.yaml", "wf_presets.json"] {
        let path = std::env::temp_dir().join(name);
        save_presets(&path, &presets).unwrap();
        let loaded = load_presets(&path).unwrap();
        assert_eq!(loaded, presets);
    }
}

#[test]
fn import_rejects_unknown_muds() {
    let mut project = project();
    let mut foreign = project.operations[0].clone();
    foreign.muds.backfill = Some("oil-based".to_string());
    let preset = PresetDef {
        name: "foreign".to_string(),
        description: None,
        operations: vec![foreign],
    };
    assert!(import_presets(&mut project, vec![preset.clone()]).is_err());
    assert!(project.presets.is_empty());

    project.muds.push(MudDef {
        id: "oil-based".to_string(),
        name: "OBM".to_string(),
        density_kg_m3: 1100.0,
        color: None,
    });
    import_presets(&mut project, vec![preset]).unwrap();
    assert_eq!(project.presets.len(), 1);
}
