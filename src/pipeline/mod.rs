/*!
 * Pipeline coordination: sequences extraction, translation, and
 * reconstruction per page, with page-level parallelism and partial-failure
 * aggregation.
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use self::coordinator::{
    DocumentResult, PageFailure, PageSuccess, PipelineCoordinator, PipelineOptions, RunStats,
};

pub mod coordinator;

/// Cooperative cancellation signal.
///
/// Checked between pages and between translation-unit batches; in-flight
/// backend calls are allowed to complete but their results are discarded.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, un-cancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; idempotent
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
