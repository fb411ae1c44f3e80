use wf_project::schema::*;
use wf_project::*;

fn mud(id: &str, density: f64) -> MudDef {
    MudDef {
        id: id.to_string(),
        name: id.to_uppercase(),
        density_kg_m3: density,
        color: None,
    }
}

fn project() -> Project {
    let mut pull = OperationDef::new("pull", OperationKindDef::TripOut, 1000.0, 100.0, "wbm");
    pull.muds.backfill = Some("heavy".to_string());
    pull.target_esd_kg_m3 = Some(1250.0);

    let mut pump = OperationDef::new("pump", OperationKindDef::Circulate, 1000.0, 0.0, "wbm");
    pump.pump = Some(PumpDef {
        min_rate_m3ps: 0.01,
        max_rate_m3ps: 0.03,
        step_volume_m3: 0.5,
        ream_rate_m3ps: 0.0,
    });
    pump.queue = vec![
        QueueEntryDef {
            mud_id: "heavy".to_string(),
            volume_m3: 2.0,
        },
        QueueEntryDef {
            mud_id: "wbm".to_string(),
            volume_m3: 10.0,
        },
    ];
    pump.required_volume_m3 = Some(12.0);

    Project {
        version: LATEST_VERSION,
        name: "Round trip".to_string(),
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
            survey: vec![
                SurveyStationDef { md: 0.0, tvd: 0.0 },
                SurveyStationDef {
                    md: 2000.0,
                    tvd: 1800.0,
                },
            ],
        },
        muds: vec![mud("wbm", 1200.0), mud("heavy", 1400.0)],
        initial: InitialStateDef {
            bit_md: 2000.0,
            mud_id: "wbm".to_string(),
            float: FloatStateDef::NotInstalled,
            string_layers: vec![],
            annulus_layers: vec![],
        },
        operations: vec![pull, pump],
        models: ModelsDef {
            swab_surge: SwabSurgeModelDef::Proportional {
                coefficient_pa_s_per_m: 20_000.0,
            },
            apl: AplModelDef::Tabulated {
                points: vec![
                    AplPointDef {
                        rate_m3ps: 0.0,
                        loss_pa: 0.0,
                    },
                    AplPointDef {
                        rate_m3ps: 0.03,
                        loss_pa: 300_000.0,
                    },
                ],
            },
        },
        presets: vec![],
    }
}

#[test]
fn roundtrip_yaml() {
    let project = project();
    validate_project(&project).unwrap();

    let path = std::env::temp_dir().join("wf_project_roundtrip.yaml");
    save_yaml(&path, &project).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(project, loaded);
}

#[test]
fn roundtrip_json() {
    let project = project();
    let path = std::env::temp_dir().join("wf_project_roundtrip.json");
    save_project(&path, &project).unwrap();
    let loaded = load_project(&path).unwrap();
    assert_eq!(project, loaded);
}

#[test]
fn missing_operation_id_gets_one() {
    let yaml = r#"
version: 1
name: ids
well:
  hole: [{ name: hole, top_md: 0.0, bottom_md: 1000.0, diameter_m: 0.2 }]
  pipe: [{ name: dp, top_md: 0.0, bottom_md: 1000.0, od_m: 0.127, id_m: 0.1 }]
muds: [{ id: m, name: M, density_kg_m3: 1100.0 }]
initial: { bit_md: 1000.0, mud_id: m }
operations:
  - { label: a, kind: TripOut, end_md: 500.0, step_size_m: 50.0, muds: { base: m } }
  - { label: b, kind: TripIn, end_md: 1000.0, step_size_m: 50.0, muds: { base: m } }
"#;
    let project: Project = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(project.operations[0].id.len(), 36);
    assert_ne!(project.operations[0].id, project.operations[1].id);
    assert_eq!(project.operations[0].eccentricity_factor, 1.0);
    validate_project(&project).unwrap();
}

#[test]
fn unknown_mud_is_rejected() {
    let mut project = project();
    project.operations[0].muds.fill = Some("missing".to_string());
    let err = validate_project(&project).unwrap_err();
    assert!(matches!(err, ValidationError::MissingReference { ref id, .. } if id == "missing"));
}

#[test]
fn duplicate_mud_is_rejected() {
    let mut project = project();
    project.muds.push(mud("wbm", 1000.0));
    let err = validate_project(&project).unwrap_err();
    assert!(matches!(err, ValidationError::DuplicateId { .. }));
}

#[test]
fn newer_version_is_rejected() {
    let mut project = project();
    project.version = LATEST_VERSION + 1;
    let err = validate_project(&project).unwrap_err();
    assert!(matches!(err, ValidationError::UnsupportedVersion { .. }));
}

#[test]
fn broken_geometry_is_rejected() {
    let mut project = project();
    project.well.pipe[0].od_m = 0.05;
    assert!(validate_project(&project).is_err());

    let mut project = self::project();
    project.well.hole[0].top_md = 10.0;
    assert!(validate_project(&project).is_err());
}

#[test]
fn ream_without_trip_speed_is_rejected() {
    let mut project = project();
    project.operations.push(OperationDef::new(
        "ream",
        OperationKindDef::ReamOut,
        1500.0,
        50.0,
        "wbm",
    ));
    assert!(validate_project(&project).is_err());
    project.operations[2].trip_speed_mps = 0.2;
    validate_project(&project).unwrap();
}

#[test]
fn initial_column_must_reach_the_bit() {
    let mut project = project();
    project.initial.string_layers = vec![
        LayerDef {
            mud_id: "heavy".to_string(),
            top_md: 0.0,
            bottom_md: 100.0,
        },
        LayerDef {
            mud_id: "wbm".to_string(),
            top_md: 100.0,
            bottom_md: 1900.0,
        },
    ];
    assert!(validate_project(&project).is_err());
    project.initial.string_layers[1].bottom_md = 2000.0;
    validate_project(&project).unwrap();
}
