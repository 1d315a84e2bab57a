//! Progress-callback trait for per-document extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the batch walks through each statement.
//!
//! # Example
//!
//! ```rust
//! use edgequake_statement::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     failed: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_document_error(&self, index: usize, total: usize, filename: &str, error: &str) {
//!         self.failed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {filename}: {error}", index + 1, total);
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { failed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch driver as it processes each document.
///
/// Documents are processed strictly one at a time, so events for a batch
/// never interleave. The trait is still `Send + Sync` because the config
/// that carries it is shared with blocking worker threads.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before the first document.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called before text extraction starts for a document.
    ///
    /// `index` is 0-based in upload order.
    fn on_document_start(&self, index: usize, total: usize, filename: &str) {
        let _ = (index, total, filename);
    }

    /// Called when a document produced a success record.
    fn on_document_complete(&self, index: usize, total: usize, filename: &str) {
        let _ = (index, total, filename);
    }

    /// Called when a document produced a failure record.
    fn on_document_error(&self, index: usize, total: usize, filename: &str, error: &str) {
        let _ = (index, total, filename, error);
    }

    /// Called once after every document has a record.
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
