//! Background run worker.
//!
//! Runs a project on its own thread and reports over a bounded channel.
//! Progress events are dropped while the channel is full; the final
//! `Complete` or `Error` message is always delivered.

use std::path::Path;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread::{self, JoinHandle};

use wf_sim::CancelToken;

use crate::error::AppResult;
use crate::progress::RunProgressEvent;
use crate::run_service::{self, RunOptions, RunRequest, RunResponse};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub enum WorkerMessage {
    Progress(RunProgressEvent),
    Complete {
        report_id: String,
        loaded_from_cache: bool,
        saved: bool,
        failed_operations: usize,
    },
    Error {
        message: String,
    },
}

pub struct RunWorker {
    pub progress_rx: Receiver<WorkerMessage>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl RunWorker {
    pub fn start(project_path: &Path, options: RunOptions) -> Self {
        let (tx, rx) = sync_channel(CHANNEL_CAPACITY);
        let project_path = project_path.to_path_buf();
        let cancel = CancelToken::new();
        let token = cancel.clone();

        let handle = thread::spawn(move || {
            let message = match Self::run(&project_path, options, &token, &tx) {
                Ok(response) => WorkerMessage::Complete {
                    failed_operations: response
                        .manifest
                        .operations
                        .iter()
                        .filter(|op| op.error.is_some())
                        .count(),
                    report_id: response.report_id,
                    loaded_from_cache: response.loaded_from_cache,
                    saved: response.saved,
                },
                Err(e) => WorkerMessage::Error {
                    message: format!("Worker error: {}", e),
                },
            };
            let _ = tx.send(message);
        });

        Self {
            progress_rx: rx,
            cancel,
            handle: Some(handle),
        }
    }

    fn run(
        project_path: &Path,
        options: RunOptions,
        cancel: &CancelToken,
        tx: &SyncSender<WorkerMessage>,
    ) -> AppResult<RunResponse> {
        let request = RunRequest {
            project_path,
            options,
        };
        // A lagging receiver loses progress events, never the outcome.
        let mut forward = |event: RunProgressEvent| {
            let _ = tx.try_send(WorkerMessage::Progress(event));
        };
        run_service::ensure_run_with_progress(&request, Some(&mut forward), Some(cancel))
    }

    /// Ask the run to stop after the current step.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Wait for the worker thread to exit.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
