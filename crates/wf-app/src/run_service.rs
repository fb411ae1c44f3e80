//! Run execution and report caching service.

use std::path::Path;
use std::time::Instant;
use tracing::info;
use wf_results::{ReportManifest, ReportStore, Timeline, compute_report_id};
use wf_sim::CancelToken;

use crate::error::AppResult;
use crate::progress::{self, RunProgressEvent, RunStage};
use crate::project_service;
use crate::sequencer::Sequencer;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Options for running a project.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub engine_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            engine_version: ENGINE_VERSION.to_string(),
        }
    }
}

/// Request to run every operation of a project.
pub struct RunRequest<'a> {
    pub project_path: &'a Path,
    pub options: RunOptions,
}

#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub compile_time_s: f64,
    pub simulate_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
    pub steps: usize,
}

#[derive(Debug, Clone)]
pub struct RunResponse {
    pub report_id: String,
    pub manifest: ReportManifest,
    pub loaded_from_cache: bool,
    /// False when the run was cancelled; partial results are not cached.
    pub saved: bool,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent::stage(
            stage,
            started.elapsed().as_secs_f64(),
            message,
        ));
    }
}

/// Execute or load a run based on request.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None, None)
}

/// Execute or load a run, streaming progress and honouring cancellation.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
    cancel: Option<&CancelToken>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();

    emit_progress(
        &mut progress_cb,
        RunStage::LoadingProject,
        started,
        Some("Loading project".to_string()),
    );
    let project = project_service::load_project(request.project_path)?;
    project_service::validate_project(&project)?;

    emit_progress(
        &mut progress_cb,
        RunStage::CheckingCache,
        started,
        Some("Checking report cache".to_string()),
    );
    let report_id = compute_report_id(&project, &request.options.engine_version);
    let store = ReportStore::for_project(request.project_path)?;

    if request.options.use_cache && store.has_report(&report_id) {
        emit_progress(
            &mut progress_cb,
            RunStage::LoadingCachedReport,
            started,
            Some("Loading cached report".to_string()),
        );
        let load_started = Instant::now();
        let manifest = store.load_manifest(&report_id)?;
        timing.load_cache_time_s = load_started.elapsed().as_secs_f64();
        timing.steps = manifest.total_steps;
        timing.total_time_s = started.elapsed().as_secs_f64();
        emit_progress(&mut progress_cb, RunStage::Completed, started, None);
        return Ok(RunResponse {
            report_id,
            manifest,
            loaded_from_cache: true,
            saved: true,
            timing,
        });
    }

    emit_progress(
        &mut progress_cb,
        RunStage::CompilingRuntime,
        started,
        Some("Compiling well and operations".to_string()),
    );
    let compile_started = Instant::now();
    let mut sequencer = Sequencer::from_project(&project)?;
    timing.compile_time_s = compile_started.elapsed().as_secs_f64();

    let simulate_started = Instant::now();
    sequencer.run_from_with(0, progress::reborrow(&mut progress_cb), cancel)?;
    timing.simulate_time_s = simulate_started.elapsed().as_secs_f64();

    let timeline = sequencer.timeline();
    timing.steps = timeline.len();
    let manifest = ReportManifest::new(
        report_id.clone(),
        &project.name,
        &request.options.engine_version,
        &timeline,
    );

    let cancelled = cancel.is_some_and(|c| c.is_cancelled());
    if !cancelled {
        emit_progress(
            &mut progress_cb,
            RunStage::SavingReport,
            started,
            Some("Saving report".to_string()),
        );
        let save_started = Instant::now();
        store.save_report(&manifest, &timeline)?;
        timing.save_time_s = save_started.elapsed().as_secs_f64();
    }

    timing.total_time_s = started.elapsed().as_secs_f64();
    info!(
        report_id = %report_id,
        steps = timing.steps,
        cancelled,
        "run finished"
    );
    emit_progress(&mut progress_cb, RunStage::Completed, started, None);

    Ok(RunResponse {
        report_id,
        manifest,
        loaded_from_cache: false,
        saved: !cancelled,
        timing,
    })
}

/// Load a saved report's manifest and timeline.
pub fn load_report(project_path: &Path, report_id: &str) -> AppResult<(ReportManifest, Timeline)> {
    let store = ReportStore::for_project(project_path)?;
    Ok(store.load_timeline(report_id)?)
}

/// Saved reports for the project at `project_path`, oldest first.
pub fn list_reports(project_path: &Path) -> AppResult<Vec<ReportManifest>> {
    let project = project_service::load_project(project_path)?;
    let store = ReportStore::for_project(project_path)?;
    Ok(store.list_reports(&project.name)?)
}
