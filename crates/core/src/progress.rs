//! Progress reporting and cooperative cancellation

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Caller-supplied progress and cancellation handle.
///
/// Checked between records; implementations must be cheap and must not
/// block.
pub trait ProgressMonitor {
    /// Called periodically with the number of records processed so far
    fn progress(&self, processed: u64);

    /// Whether the caller has asked to stop
    fn is_cancelled(&self) -> bool;
}

/// Monitor that ignores progress and never cancels
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMonitor;

impl ProgressMonitor for NullMonitor {
    fn progress(&self, _processed: u64) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shareable cancellation flag.
///
/// Clones observe the same flag, so one clone can be handed to another
/// thread and used to stop a running aggregation.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    processed: Arc<AtomicU64>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Last progress value reported
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }
}

impl ProgressMonitor for CancellationToken {
    fn progress(&self, processed: u64) {
        self.processed.store(processed, Ordering::Relaxed);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl<M: ProgressMonitor + ?Sized> ProgressMonitor for &M {
    fn progress(&self, processed: u64) {
        (**self).progress(processed)
    }

    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}
