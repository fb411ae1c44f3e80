//! Run, cache and reload a project through the service layer.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use wf_app::{
    RunOptions, RunProgressEvent, RunRequest, RunStage, RunWorker, WorkerMessage,
    ensure_run, ensure_run_with_progress, extract_series, get_report_summary, list_reports,
    load_report,
};
use wf_sim::CancelToken;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}-{nanos}"));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

/// Copy the demo project into a scratch directory so reports land there.
fn demo_project(prefix: &str) -> PathBuf {
    let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/trip_2000m.yaml");
    let dir = unique_temp_dir(prefix);
    let target = dir.join("trip_2000m.yaml");
    fs::copy(&source, &target).expect("failed to copy demo project");
    target
}

fn fresh_options() -> RunOptions {
    RunOptions {
        use_cache: false,
        ..RunOptions::default()
    }
}

#[test]
fn demo_runs_and_persists_report() {
    let project_path = demo_project("wf-app-run");
    let request = RunRequest {
        project_path: &project_path,
        options: fresh_options(),
    };

    let response = ensure_run(&request).expect("demo run failed");
    assert!(!response.loaded_from_cache);
    assert!(response.saved);
    assert_eq!(response.manifest.operations.len(), 3);
    assert!(
        response.manifest.operations.iter().all(|op| op.error.is_none()),
        "demo operations should all complete: {:?}",
        response.manifest.operations
    );

    let reports = list_reports(&project_path).expect("failed to list reports");
    assert!(reports.iter().any(|r| r.report_id == response.report_id));

    let (manifest, timeline) =
        load_report(&project_path, &response.report_id).expect("failed to load report");
    assert_eq!(manifest.total_steps, timeline.len());
    assert_eq!(timeline.len(), response.timing.steps);

    let summary = get_report_summary(&timeline).expect("summary");
    assert_eq!(summary.operation_count, 3);
    assert_eq!(summary.failed_operations, 0);
    assert!((summary.bit_md_range.0 - 1200.0).abs() < 1e-6);
    assert!((summary.bit_md_range.1 - 2000.0).abs() < 1e-6);

    let bit = extract_series(&timeline, "bit_md").expect("bit series");
    assert_eq!(bit.len(), timeline.len());
    assert!(extract_series(&timeline, "temperature").is_err());
}

#[test]
fn second_run_loads_from_cache() {
    let project_path = demo_project("wf-app-cache");
    let first = ensure_run(&RunRequest {
        project_path: &project_path,
        options: RunOptions::default(),
    })
    .expect("first run failed");
    assert!(!first.loaded_from_cache);

    let mut events = Vec::new();
    let second = ensure_run_with_progress(
        &RunRequest {
            project_path: &project_path,
            options: RunOptions::default(),
        },
        Some(&mut |event: RunProgressEvent| events.push(event.stage)),
        None,
    )
    .expect("second run failed");

    assert!(second.loaded_from_cache);
    assert_eq!(second.report_id, first.report_id);
    assert!(events.contains(&RunStage::LoadingCachedReport));
    assert!(!events.contains(&RunStage::RunningOperation));
}

#[test]
fn engine_version_changes_report_id() {
    let project_path = demo_project("wf-app-version");
    let a = ensure_run(&RunRequest {
        project_path: &project_path,
        options: fresh_options(),
    })
    .unwrap();
    let b = ensure_run(&RunRequest {
        project_path: &project_path,
        options: RunOptions {
            use_cache: false,
            engine_version: "test-engine".to_string(),
        },
    })
    .unwrap();
    assert_ne!(a.report_id, b.report_id);
}

#[test]
fn progress_reports_operation_steps() {
    let project_path = demo_project("wf-app-progress");
    let mut events = Vec::new();
    let response = ensure_run_with_progress(
        &RunRequest {
            project_path: &project_path,
            options: fresh_options(),
        },
        Some(&mut |event: RunProgressEvent| events.push(event)),
        None,
    )
    .expect("run failed");

    assert!(events.iter().any(|e| e.stage == RunStage::CompilingRuntime));
    assert!(events.iter().any(|e| e.stage == RunStage::SavingReport));
    assert_eq!(events.last().map(|e| e.stage), Some(RunStage::Completed));

    let steps: Vec<_> = events.iter().filter_map(|e| e.operation.as_ref()).collect();
    assert_eq!(steps.len(), response.timing.steps);
    assert!(steps.iter().any(|op| op.operation_index == 2));
    assert!(steps.iter().all(|op| op.operation_count == 3));
}

#[test]
fn missing_project_is_an_error() {
    let dir = unique_temp_dir("wf-app-missing");
    let path = dir.join("absent.yaml");
    let result = ensure_run(&RunRequest {
        project_path: &path,
        options: fresh_options(),
    });
    assert!(matches!(
        result,
        Err(wf_app::AppError::ProjectFileRead { .. })
    ));
}

#[test]
fn worker_reports_completion() {
    let project_path = demo_project("wf-app-worker");
    let mut worker = RunWorker::start(&project_path, fresh_options());

    let messages: Vec<WorkerMessage> = worker.progress_rx.iter().collect();
    worker.join();
    assert!(worker.is_finished());

    match messages.last() {
        Some(WorkerMessage::Complete {
            saved,
            failed_operations,
            loaded_from_cache,
            ..
        }) => {
            assert!(*saved);
            assert!(!*loaded_from_cache);
            assert_eq!(*failed_operations, 0);
        }
        other => panic!("expected completion, got {other:?}"),
    }
}

#[test]
fn cancelled_run_is_not_cached() {
    let project_path = demo_project("wf-app-cancel");
    let token = CancelToken::new();
    token.cancel();

    let response = ensure_run_with_progress(
        &RunRequest {
            project_path: &project_path,
            options: fresh_options(),
        },
        None,
        Some(&token),
    )
    .expect("cancelled run still returns a response");

    assert!(!response.saved);
    assert!(response.manifest.operations[0].error.is_some());
    assert!(list_reports(&project_path).unwrap().is_empty());
}
