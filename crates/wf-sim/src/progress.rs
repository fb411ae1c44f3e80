//! Step progress reporting and cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Progress of one operation, emitted after every committed step.
#[derive(Debug, Clone)]
pub struct StepProgress {
    pub step: usize,
    pub total_steps: usize,
    pub bit_md: f64,
    pub fraction_complete: f64,
    pub message: String,
}

/// Shared flag checked between steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can drive another run.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
