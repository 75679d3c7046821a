//! Narrow interface to whatever drives the job

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Progress and cancellation hooks of the hosting scheduler.
///
/// Steps are reported once per processed entry, and once per resource during
/// rollback. Cancellation is polled a single time, before any entry is read.
pub trait JobProgress {
    fn start_step(&mut self) {}

    fn end_step(&mut self) {}

    fn is_canceled(&self) -> bool {
        false
    }
}

/// Driver that ignores progress and never cancels
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl JobProgress for NoProgress {}

/// Shared cancellation flag that can be raised from another thread
#[derive(Debug, Default, Clone)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl JobProgress for CancelFlag {
    fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counts steps; used by the CLI to report how much work a run did
#[derive(Debug, Default, Clone)]
pub struct StepCounter {
    pub started: usize,
    pub ended: usize,
    pub cancel: CancelFlag,
}

impl JobProgress for StepCounter {
    fn start_step(&mut self) {
        self.started += 1;
    }

    fn end_step(&mut self) {
        self.ended += 1;
    }

    fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }
}
