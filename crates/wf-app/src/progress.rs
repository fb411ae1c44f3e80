use wf_sim::StepProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingProject,
    CheckingCache,
    LoadingCachedReport,
    CompilingRuntime,
    RunningOperation,
    SavingReport,
    Completed,
}

impl RunStage {
    pub fn label(self) -> &'static str {
        match self {
            RunStage::LoadingProject => "loading project",
            RunStage::CheckingCache => "checking cache",
            RunStage::LoadingCachedReport => "loading cached report",
            RunStage::CompilingRuntime => "compiling",
            RunStage::RunningOperation => "running",
            RunStage::SavingReport => "saving report",
            RunStage::Completed => "completed",
        }
    }
}

/// Where a running operation stands.
#[derive(Debug, Clone, Default)]
pub struct OperationProgress {
    pub operation_index: usize,
    pub operation_count: usize,
    pub label: String,
    pub step: usize,
    pub total_steps: usize,
    pub bit_md: f64,
    pub fraction_complete: f64,
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub operation: Option<OperationProgress>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
            operation: None,
        }
    }

    pub(crate) fn step(
        operation_index: usize,
        operation_count: usize,
        label: &str,
        step: &StepProgress,
        elapsed_wall_s: f64,
    ) -> Self {
        Self {
            stage: RunStage::RunningOperation,
            elapsed_wall_s,
            message: Some(step.message.clone()),
            operation: Some(OperationProgress {
                operation_index,
                operation_count,
                label: label.to_string(),
                step: step.step,
                total_steps: step.total_steps,
                bit_md: step.bit_md,
                fraction_complete: step.fraction_complete,
            }),
        }
    }
}

/// Reborrow an optional callback for a nested call, keeping the original usable.
pub(crate) fn reborrow<'a>(
    cb: &'a mut Option<&mut dyn FnMut(RunProgressEvent)>,
) -> Option<&'a mut dyn FnMut(RunProgressEvent)> {
    match cb {
        Some(cb) => Some(&mut **cb),
        None => None,
    }
}
