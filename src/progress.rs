//! Progress-callback trait for per-document pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgress>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as a command walks the manifest. The CLI uses it to drive a
//! terminal progress bar; library callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use corpus_press::{PipelineConfig, PipelineProgress};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl PipelineProgress for Counter {
//!     fn on_document_complete(&self, _index: usize, _total: usize, title: &str) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("done: {title}");
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the workflow commands as they process each record.
///
/// All methods default to no-ops so implementors override only what they
/// need. Indices are 1-indexed positions within the records the command
/// actually visits.
pub trait PipelineProgress: Send + Sync {
    /// Called once before the first record.
    fn on_run_start(&self, command: &str, total: usize) {
        let _ = (command, total);
    }

    /// Called when work on a record begins.
    fn on_document_start(&self, index: usize, total: usize, title: &str) {
        let _ = (index, total, title);
    }

    /// Called when a record finished successfully.
    fn on_document_complete(&self, index: usize, total: usize, title: &str) {
        let _ = (index, total, title);
    }

    /// Called when a record was deliberately passed over.
    fn on_document_skipped(&self, index: usize, total: usize, title: &str, reason: &str) {
        let _ = (index, total, title, reason);
    }

    /// Called when a record failed; the run continues.
    fn on_document_error(&self, index: usize, total: usize, title: &str, error: &str) {
        let _ = (index, total, title, error);
    }

    /// Called for intra-document progress (OCR page N of M, chunk N of M).
    fn on_step(&self, message: &str) {
        let _ = message;
    }

    /// Called once after the last record.
    fn on_run_complete(&self, processed: usize, failed: usize) {
        let _ = (processed, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl PipelineProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgress>;

/// Fan events out to an optional callback.
///
/// Workflow code calls these unconditionally; the `None` case costs nothing.
pub(crate) struct Reporter<'a> {
    cb: Option<&'a ProgressCallback>,
    total: usize,
}

impl<'a> Reporter<'a> {
    pub(crate) fn new(cb: Option<&'a ProgressCallback>, command: &str, total: usize) -> Self {
        if let Some(cb) = cb {
            cb.on_run_start(command, total);
        }
        Self { cb, total }
    }

    pub(crate) fn start(&self, index: usize, title: &str) {
        if let Some(cb) = self.cb {
            cb.on_document_start(index, self.total, title);
        }
    }

    pub(crate) fn complete(&self, index: usize, title: &str) {
        if let Some(cb) = self.cb {
            cb.on_document_complete(index, self.total, title);
        }
    }

    pub(crate) fn skipped(&self, index: usize, title: &str, reason: &str) {
        if let Some(cb) = self.cb {
            cb.on_document_skipped(index, self.total, title, reason);
        }
    }

    pub(crate) fn error(&self, index: usize, title: &str, error: &str) {
        if let Some(cb) = self.cb {
            cb.on_document_error(index, self.total, title, error);
        }
    }

    pub(crate) fn step(&self, message: &str) {
        if let Some(cb) = self.cb {
            cb.on_step(message);
        }
    }

    pub(crate) fn finish(&self, processed: usize, failed: usize) {
        if let Some(cb) = self.cb {
            cb.on_run_complete(processed, failed);
        }
    }
}
