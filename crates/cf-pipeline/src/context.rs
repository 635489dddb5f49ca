//! Per-run execution context: cancellation and progress.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::orchestrator::PipelineState;

/// A state transition reported during a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub state: PipelineState,
    /// Share of the planned steps completed when the state was entered.
    pub percent: f32,
}

/// Sender for reporting progress from within a run.
///
/// Owned by a single run; concurrent runs each carry their own.
pub struct ProgressSender {
    callback: Box<dyn Fn(&ProgressEvent) + Send + Sync>,
}

impl ProgressSender {
    /// Create a new sender from the given callback.
    pub fn new(callback: impl Fn(&ProgressEvent) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Create a no-op sender that discards all progress reports.
    pub fn noop() -> Self {
        Self {
            callback: Box::new(|_| {}),
        }
    }

    /// Report progress.
    pub fn send(&self, event: &ProgressEvent) {
        (self.callback)(event);
    }
}

impl std::fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSender").finish_non_exhaustive()
    }
}

/// Context passed to [`PipelineOrchestrator::run`](crate::PipelineOrchestrator::run).
///
/// A context may be shared by several runs; each run still gets its own
/// [`RunId`](cf_core::RunId) and temporary names.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// When cancelled, the in-flight engine process is killed and the run
    /// ends with [`cf_core::Error::Cancelled`] after cleanup.
    pub cancellation: CancellationToken,
    pub progress: Arc<ProgressSender>,
}

impl RunContext {
    /// A context with its own token and no progress reporting.
    pub fn new() -> Self {
        Self {
            cancellation: CancellationToken::new(),
            progress: Arc::new(ProgressSender::noop()),
        }
    }

    /// Builder: attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Builder: attach a progress sender.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Arc::new(progress);
        self
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
