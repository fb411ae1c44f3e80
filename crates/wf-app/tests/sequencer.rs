//! Operation chaining, invalidation and failure propagation.

use wf_app::{OperationStatus, RunProgressEvent, Sequencer};
use wf_project::schema::*;
use wf_sim::{CancelToken, ErrorKind};

fn mud(id: &str, density: f64) -> MudDef {
    MudDef {
        id: id.to_string(),
        name: id.to_uppercase(),
        density_kg_m3: density,
        color: None,
    }
}

fn project(operations: Vec<OperationDef>) -> Project {
    Project {
        version: wf_project::LATEST_VERSION,
        name: "sequencer".to_string(),
        well: WellDef {
            hole: vec![HoleSectionDef {
                name: "open hole".to_string(),
                top_md: 0.0,
                bottom_md: 2000.0,
                diameter_m: 0.2159,
                cased: false,
            }],
            pipe: vec![PipeSectionDef {
                name: "drill pipe".to_string(),
                top_md: 0.0,
                bottom_md: 2000.0,
                od_m: 0.127,
                id_m: 0.1086,
            }],
            survey: Vec::new(),
        },
        muds: vec![mud("wbm", 1200.0), mud("heavy", 1400.0)],
        initial: InitialStateDef {
            bit_md: 2000.0,
            mud_id: "wbm".to_string(),
            float: FloatStateDef::NotInstalled,
            string_layers: Vec::new(),
            annulus_layers: Vec::new(),
        },
        operations,
        models: ModelsDef::default(),
        presets: Vec::new(),
    }
}

fn trip_out(end_md: f64) -> OperationDef {
    OperationDef::new("pull", OperationKindDef::TripOut, end_md, 100.0, "wbm")
}

fn trip_in(end_md: f64) -> OperationDef {
    OperationDef::new("run in", OperationKindDef::TripIn, end_md, 100.0, "wbm")
}

#[test]
fn operations_chain_through_outputs() {
    let mut seq = Sequencer::from_project(&project(vec![trip_out(1500.0), trip_in(2000.0)]))
        .expect("project should compile");
    seq.run_all().expect("run should start");

    assert!(seq.statuses().iter().all(OperationStatus::is_complete));
    let pulled = seq.operation(0).unwrap();
    assert_eq!(pulled.records().len(), 6);
    assert!((pulled.output().unwrap().bit_md - 1500.0).abs() < 1e-9);

    let ran_in = seq.operation(1).unwrap();
    assert!((ran_in.records()[0].bit_md() - 1500.0).abs() < 1e-9);
    assert!((seq.final_state().unwrap().bit_md - 2000.0).abs() < 1e-9);

    let timeline = seq.timeline();
    assert_eq!(timeline.len(), 12);
    assert_eq!(timeline.operation_range(1), Some(6..12));
}

#[test]
fn editing_an_operation_discards_downstream_results() {
    let mut seq = Sequencer::from_project(&project(vec![trip_out(1500.0), trip_in(2000.0)]))
        .unwrap();
    seq.run_all().unwrap();

    seq.update_operation(0, trip_out(1600.0)).unwrap();
    assert_eq!(
        seq.statuses(),
        vec![OperationStatus::Pending, OperationStatus::Pending]
    );
    assert!(seq.operation(1).unwrap().records().is_empty());

    seq.run_all().unwrap();
    assert!((seq.operation(1).unwrap().records()[0].bit_md() - 1600.0).abs() < 1e-9);
}

#[test]
fn rerunning_an_operation_invalidates_later_ones() {
    let mut seq = Sequencer::from_project(&project(vec![trip_out(1500.0), trip_in(2000.0)]))
        .unwrap();
    seq.run_all().unwrap();

    let status = seq.run(0).unwrap().clone();
    assert_eq!(status, OperationStatus::Complete);
    assert_eq!(seq.operation(1).unwrap().status(), &OperationStatus::Pending);
}

#[test]
fn failed_rerun_keeps_later_results_as_blocked() {
    let mut seq = Sequencer::from_project(&project(vec![trip_out(1500.0), trip_in(2000.0)]))
        .unwrap();
    seq.run_all().unwrap();
    let before = seq.operation(1).unwrap().records().len();
    assert_eq!(before, 6);

    seq.set_muds(vec![mud("heavy", 1400.0)]);
    let status = seq.run(0).unwrap().clone();
    assert!(matches!(
        status,
        OperationStatus::Error {
            kind: ErrorKind::UnresolvedMud,
            ..
        }
    ));

    let later = seq.operation(1).unwrap();
    assert_eq!(later.status(), &OperationStatus::Blocked { upstream: 0 });
    assert_eq!(later.records().len(), before);
    assert!(later.output().is_none());

    seq.run_from(1).unwrap();
    let later = seq.operation(1).unwrap();
    assert_eq!(later.status(), &OperationStatus::Blocked { upstream: 0 });
    assert_eq!(later.records().len(), before);
    let timeline = seq.timeline();
    assert_eq!(timeline.len(), before);
    assert!(timeline.segments().iter().all(|s| s.error.is_some()));
}

#[test]
fn failure_blocks_every_later_operation() {
    let mut seq = Sequencer::from_project(&project(vec![
        trip_in(2500.0),
        trip_out(1500.0),
        trip_in(2000.0),
    ]))
    .unwrap();
    seq.run_all().unwrap();

    let statuses = seq.statuses();
    assert!(matches!(statuses[0], OperationStatus::Error { .. }));
    assert_eq!(statuses[1], OperationStatus::Blocked { upstream: 0 });
    assert_eq!(statuses[2], OperationStatus::Blocked { upstream: 0 });

    let timeline = seq.timeline();
    assert!(timeline.segments().iter().all(|s| s.error.is_some()));
}

#[test]
fn wrong_direction_reports_invalid_range() {
    let mut seq = Sequencer::from_project(&project(vec![trip_out(1500.0), trip_out(1800.0)]))
        .unwrap();
    seq.run_all().unwrap();

    match seq.operation(1).unwrap().status() {
        OperationStatus::Error { kind, .. } => assert_eq!(*kind, ErrorKind::InvalidRange),
        other => panic!("expected an error, got {other:?}"),
    }
}

#[test]
fn removed_mud_surfaces_on_next_run() {
    let mut seq = Sequencer::from_project(&project(vec![trip_out(1500.0), trip_in(2000.0)]))
        .unwrap();
    seq.run_all().unwrap();

    seq.set_muds(vec![mud("heavy", 1400.0)]);
    assert!(seq.statuses().iter().all(OperationStatus::is_complete));

    let status = seq.run(1).unwrap();
    assert!(matches!(
        status,
        OperationStatus::Error {
            kind: ErrorKind::UnresolvedMud,
            ..
        }
    ));
}

#[test]
fn cancellation_keeps_partial_records() {
    let mut seq = Sequencer::from_project(&project(vec![trip_out(1500.0), trip_in(2000.0)]))
        .unwrap();
    let token = CancelToken::new();
    let mut cb = |event: RunProgressEvent| {
        if event.operation.as_ref().is_some_and(|op| op.step == 2) {
            token.cancel();
        }
    };
    seq.run_from_with(0, Some(&mut cb), Some(&token)).unwrap();

    let first = seq.operation(0).unwrap();
    assert!(matches!(
        first.status(),
        OperationStatus::Error {
            kind: ErrorKind::Cancelled,
            ..
        }
    ));
    assert_eq!(first.records().len(), 3);
    assert_eq!(
        seq.operation(1).unwrap().status(),
        &OperationStatus::Blocked { upstream: 0 }
    );
    assert_eq!(seq.timeline().len(), 3);
}

#[test]
fn moving_an_operation_reruns_from_the_lower_position() {
    let mut seq = Sequencer::from_project(&project(vec![
        trip_out(1800.0),
        trip_out(1500.0),
        trip_in(2000.0),
    ]))
    .unwrap();
    seq.run_all().unwrap();
    assert!(seq.statuses().iter().all(OperationStatus::is_complete));

    seq.move_operation(1, 0).unwrap();
    let statuses = seq.statuses();
    assert_eq!(statuses[0], OperationStatus::Complete);
    assert!(matches!(
        statuses[1],
        OperationStatus::Error {
            kind: ErrorKind::InvalidRange,
            ..
        }
    ));
    assert_eq!(statuses[2], OperationStatus::Blocked { upstream: 1 });
}

#[test]
fn index_errors_are_reported() {
    let mut seq = Sequencer::from_project(&project(vec![trip_out(1500.0)])).unwrap();
    assert!(seq.run(3).is_err());
    assert!(seq.remove(1).is_err());
    assert!(seq.insert(1, trip_in(2000.0)).is_ok());
    assert_eq!(seq.len(), 2);
}

#[test]
fn unbootstrapped_sequencer_refuses_to_run() {
    let project = project(vec![trip_out(1500.0)]);
    let runtime = wf_app::compile_project(&project).unwrap();
    let mut seq = Sequencer::new(runtime.geometry, runtime.models, project.muds.clone());
    seq.push(trip_out(1500.0));
    assert!(matches!(seq.run(0), Err(wf_app::AppError::NotBootstrapped)));
}
