//! Progress-callback trait for per-reference relocation events.
//!
//! Inject an [`Arc<dyn RelocationProgress>`] via
//! [`crate::config::DestinationConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline processes each image reference.
//!
//! Callbacks are the least-invasive integration point: callers can forward
//! events to a terminal progress bar, a WebSocket, or a log sink without
//! the library knowing anything about how the host application
//! communicates.

use std::sync::Arc;

/// Called by the relocation pipeline as it processes each image reference.
///
/// References are processed sequentially in document order, so calls arrive
/// in order and never concurrently. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait RelocationProgress: Send + Sync {
    /// Called once after scanning, before any reference is processed.
    fn on_run_start(&self, total_references: usize) {
        let _ = total_references;
    }

    /// Called just before a reference is classified and (maybe) uploaded.
    ///
    /// `index` is 1-based position in document order.
    fn on_reference_start(&self, index: usize, total: usize, target: &str) {
        let _ = (index, total, target);
    }

    /// Called when a reference's asset was uploaded and will be rewritten.
    fn on_reference_replaced(&self, index: usize, total: usize, public_url: &str) {
        let _ = (index, total, public_url);
    }

    /// Called when a reference is left untouched — already remote, asset
    /// missing, or upload rejected. `detail` is a human-readable reason.
    fn on_reference_skipped(&self, index: usize, total: usize, detail: &str) {
        let _ = (index, total, detail);
    }

    /// Called once after all references have been attempted.
    fn on_run_complete(&self, total_references: usize, replaced: usize) {
        let _ = (total_references, replaced);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl RelocationProgress for NoopProgress {}

/// Convenience alias matching the type stored in
/// [`crate::config::DestinationConfig`].
pub type ProgressCallback = Arc<dyn RelocationProgress>;
