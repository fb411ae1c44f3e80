//! Ordered operations chained through their output states.
//!
//! Operation `i` runs against the output of operation `i - 1`, or against the
//! bootstrap state for `i = 0`. Editing, inserting, removing or moving an
//! operation discards the outputs from that position down.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wf_geometry::WellGeometry;
use wf_layers::WellboreState;
use wf_project::schema::{MudDef, OperationDef, Project};
use wf_results::{Timeline, TimelineSegment};
use wf_sim::{
    CancelToken, ErrorKind, ModelSet, SimContext, StepProgress, StepRecord, run_operation,
};

use crate::error::{AppError, AppResult};
use crate::progress::{self, RunProgressEvent};
use crate::runtime_compile::{compile_kind, compile_operation, compile_project};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum OperationStatus {
    Pending,
    Running,
    Complete,
    /// Failed; committed records are kept on the operation.
    Error { kind: ErrorKind, message: String },
    /// Input missing because `upstream` did not complete.
    Blocked { upstream: usize },
}

impl OperationStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, OperationStatus::Complete)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::Pending => f.write_str("pending"),
            OperationStatus::Running => f.write_str("running"),
            OperationStatus::Complete => f.write_str("complete"),
            OperationStatus::Error { kind, message } => write!(f, "error ({kind}): {message}"),
            OperationStatus::Blocked { upstream } => {
                write!(f, "blocked by upstream error in operation {upstream}")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SequencedOperation {
    config: OperationDef,
    status: OperationStatus,
    records: Vec<StepRecord>,
    output: Option<WellboreState>,
}

impl SequencedOperation {
    fn new(config: OperationDef) -> Self {
        Self {
            config,
            status: OperationStatus::Pending,
            records: Vec::new(),
            output: None,
        }
    }

    fn reset(&mut self) {
        self.status = OperationStatus::Pending;
        self.records.clear();
        self.output = None;
    }

    pub fn config(&self) -> &OperationDef {
        &self.config
    }

    pub fn status(&self) -> &OperationStatus {
        &self.status
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn output(&self) -> Option<&WellboreState> {
        self.output.as_ref()
    }
}

pub struct Sequencer {
    geometry: Arc<WellGeometry>,
    models: ModelSet,
    muds: Vec<MudDef>,
    bootstrap: Option<WellboreState>,
    operations: Vec<SequencedOperation>,
}

impl Sequencer {
    pub fn new(geometry: Arc<WellGeometry>, models: ModelSet, muds: Vec<MudDef>) -> Self {
        Self {
            geometry,
            models,
            muds,
            bootstrap: None,
            operations: Vec::new(),
        }
    }

    /// Compile a project and queue its operations, bootstrapped from its
    /// initial state. Nothing is run yet.
    pub fn from_project(project: &Project) -> AppResult<Self> {
        let runtime = compile_project(project)?;
        let mut sequencer = Self::new(runtime.geometry, runtime.models, project.muds.clone());
        sequencer.bootstrap(runtime.initial);
        for op in &project.operations {
            sequencer.push(op.clone());
        }
        Ok(sequencer)
    }

    pub fn geometry(&self) -> &WellGeometry {
        &self.geometry
    }

    /// Set the state the first operation starts from.
    pub fn bootstrap(&mut self, state: WellboreState) {
        self.bootstrap = Some(state);
        self.invalidate_from(0);
    }

    pub fn initial_state(&self) -> Option<&WellboreState> {
        self.bootstrap.as_ref()
    }

    pub fn muds(&self) -> &[MudDef] {
        &self.muds
    }

    /// Replace the mud catalog. Outputs are kept; the next run of each
    /// operation resolves against the new catalog.
    pub fn set_muds(&mut self, muds: Vec<MudDef>) {
        self.muds = muds;
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[SequencedOperation] {
        &self.operations
    }

    pub fn operation(&self, index: usize) -> Option<&SequencedOperation> {
        self.operations.get(index)
    }

    pub fn statuses(&self) -> Vec<OperationStatus> {
        self.operations.iter().map(|op| op.status.clone()).collect()
    }

    /// Output of the last operation, or the bootstrap state when there are none.
    pub fn final_state(&self) -> Option<&WellboreState> {
        match self.operations.last() {
            Some(op) => op.output.as_ref(),
            None => self.bootstrap.as_ref(),
        }
    }

    fn check_index(&self, index: usize, len: usize) -> AppResult<()> {
        if index >= len {
            return Err(AppError::OperationIndex {
                index,
                len: self.operations.len(),
            });
        }
        Ok(())
    }

    fn invalidate_from(&mut self, index: usize) {
        let mut cleared = 0;
        for op in self.operations.iter_mut().skip(index) {
            if op.status != OperationStatus::Pending {
                cleared += 1;
            }
            op.reset();
        }
        if cleared > 0 {
            debug!(from = index, cleared, "invalidated downstream operations");
        }
    }

    /// Mark everything from `index` on that has run as blocked by `upstream`.
    /// Records stay for inspection; outputs go so nothing chains off them.
    fn block_from(&mut self, index: usize, upstream: usize) {
        for op in self.operations.iter_mut().skip(index) {
            if op.status == OperationStatus::Pending {
                continue;
            }
            op.output = None;
            op.status = OperationStatus::Blocked { upstream };
        }
    }

    pub fn push(&mut self, config: OperationDef) -> usize {
        self.operations.push(SequencedOperation::new(config));
        self.operations.len() - 1
    }

    pub fn insert(&mut self, index: usize, config: OperationDef) -> AppResult<()> {
        self.check_index(index, self.operations.len() + 1)?;
        self.operations.insert(index, SequencedOperation::new(config));
        self.invalidate_from(index);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> AppResult<OperationDef> {
        self.check_index(index, self.operations.len())?;
        let removed = self.operations.remove(index);
        self.invalidate_from(index);
        Ok(removed.config)
    }

    /// Replace an operation's config, discarding its output and everything below.
    pub fn update_operation(&mut self, index: usize, config: OperationDef) -> AppResult<()> {
        self.check_index(index, self.operations.len())?;
        self.operations[index].config = config;
        self.invalidate_from(index);
        Ok(())
    }

    /// Reorder, then rerun from the lower of the two positions.
    pub fn move_operation(&mut self, from: usize, to: usize) -> AppResult<()> {
        let len = self.operations.len();
        self.check_index(from, len)?;
        self.check_index(to, len)?;
        if self.bootstrap.is_none() {
            return Err(AppError::NotBootstrapped);
        }
        if from == to {
            return Ok(());
        }
        let op = self.operations.remove(from);
        self.operations.insert(to, op);
        let lower = from.min(to);
        self.invalidate_from(lower);
        self.run_from(lower)
    }

    pub fn run(&mut self, index: usize) -> AppResult<&OperationStatus> {
        self.run_with(index, None, None)
    }

    pub fn run_from(&mut self, index: usize) -> AppResult<()> {
        self.run_from_with(index, None, None)
    }

    pub fn run_all(&mut self) -> AppResult<()> {
        self.run_from(0)
    }

    /// Run `index..` in order. Operations after a failure end up `Blocked`.
    pub fn run_from_with(
        &mut self,
        index: usize,
        mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
        cancel: Option<&CancelToken>,
    ) -> AppResult<()> {
        self.check_index(index, self.operations.len() + 1)?;
        for i in index..self.operations.len() {
            self.run_with(i, progress::reborrow(&mut progress_cb), cancel)?;
        }
        Ok(())
    }

    /// Run one operation against its upstream output.
    ///
    /// Simulation failures are recorded on the operation, not returned; the
    /// error path is for bad indices and a missing bootstrap. A success
    /// discards later results; a failure leaves them in place as `Blocked`.
    pub fn run_with(
        &mut self,
        index: usize,
        mut progress: Option<&mut dyn FnMut(RunProgressEvent)>,
        cancel: Option<&CancelToken>,
    ) -> AppResult<&OperationStatus> {
        self.check_index(index, self.operations.len())?;
        if self.bootstrap.is_none() {
            return Err(AppError::NotBootstrapped);
        }

        let input = if index == 0 {
            self.bootstrap.clone()
        } else {
            self.operations[index - 1].output.clone()
        };
        let Some(input) = input else {
            let upstream = match self.operations[index - 1].status {
                OperationStatus::Blocked { upstream } => upstream,
                _ => index - 1,
            };
            let op = &mut self.operations[index];
            op.output = None;
            op.status = OperationStatus::Blocked { upstream };
            self.block_from(index + 1, upstream);
            warn!(index, upstream, "operation blocked by upstream");
            return Ok(&self.operations[index].status);
        };

        let op = &mut self.operations[index];
        op.reset();
        op.status = OperationStatus::Running;

        let plan = match compile_operation(&op.config, &self.muds) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(index, error = %e, "operation failed to compile");
                op.status = OperationStatus::Error {
                    kind: e.kind(),
                    message: e.to_string(),
                };
                self.block_from(index + 1, index);
                return Ok(&self.operations[index].status);
            }
        };

        info!(index, label = %plan.label, kind = %plan.kind, "running operation");
        let started = Instant::now();
        let count = self.operations.len();
        let label = plan.label.clone();
        let mut forward = |p: StepProgress| {
            if let Some(cb) = progress.as_deref_mut() {
                cb(RunProgressEvent::step(
                    index,
                    count,
                    &label,
                    &p,
                    started.elapsed().as_secs_f64(),
                ));
            }
        };
        let ctx = SimContext {
            geometry: self.geometry.as_ref(),
            models: &self.models,
        };
        let result = run_operation(&plan, &input, ctx, Some(&mut forward), cancel);

        let op = &mut self.operations[index];
        match result {
            Ok(run) => {
                op.records = run.records;
                op.output = Some(run.output);
                op.status = OperationStatus::Complete;
                // Whatever ran below this operation was built on its old output.
                self.invalidate_from(index + 1);
            }
            Err(failure) => {
                op.records = failure.partial;
                op.status = OperationStatus::Error {
                    kind: failure.error.kind(),
                    message: failure.error.to_string(),
                };
                self.block_from(index + 1, index);
            }
        }
        Ok(&self.operations[index].status)
    }

    /// Every operation's records in one index space, failures included.
    pub fn timeline(&self) -> Timeline {
        Timeline::from_segments(self.operations.iter().map(|op| TimelineSegment {
            operation_id: op.config.id.clone(),
            label: op.config.label.clone(),
            kind: compile_kind(op.config.kind),
            records: op.records.clone(),
            error: match &op.status {
                OperationStatus::Error { .. } | OperationStatus::Blocked { .. } => {
                    Some(op.status.to_string())
                }
                _ => None,
            },
        }))
    }
}
