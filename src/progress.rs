//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::RankingConfigBuilder::progress_callback`] to receive
//! events as the orchestrator works through the uploads.
//!
//! # Example
//!
//! ```rust
//! use edgequake_ats::{BatchProgressCallback, RankingConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counting {
//!     done: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for Counting {
//!     fn on_document_start(&self, index: usize, total: usize, name: &str) {
//!         eprintln!("Processing {}/{}: {}", index + 1, total, name);
//!     }
//!     fn on_document_complete(&self, _index: usize, _total: usize, _score: Option<i64>) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = RankingConfig::builder()
//!     .progress_callback(Arc::new(Counting { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it processes each document.
///
/// All methods have no-op defaults. `index` is 0-based; `total` is the
/// number of uploads in the batch.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first document.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called as a document starts, before extraction.
    fn on_document_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called after each failed attempt that will be retried or exhausted.
    ///
    /// `attempt` is 1-based.
    fn on_attempt_failed(&self, index: usize, attempt: u32, error: &str) {
        let _ = (index, attempt, error);
    }

    /// Called when a document produced a verdict.
    fn on_document_complete(&self, index: usize, total: usize, score: Option<i64>) {
        let _ = (index, total, score);
    }

    /// Called when a document produced no verdict.
    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every document has been attempted (or skipped).
    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        let _ = (total, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RankingConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl BatchProgressCallback for Recorder {
        fn on_document_start(&self, index: usize, total: usize, name: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start {}/{} {}", index + 1, total, name));
        }

        fn on_document_error(&self, index: usize, _total: usize, error: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error {} {}", index + 1, error));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_document_start(0, 2, "a.pdf");
        cb.on_attempt_failed(0, 1, "timeout");
        cb.on_document_complete(0, 2, Some(70));
        cb.on_document_error(1, 2, "bad pdf");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let rec = Recorder::default();
        rec.on_document_start(0, 2, "a.pdf");
        rec.on_document_complete(0, 2, Some(10));
        rec.on_document_error(1, 2, "bad pdf");

        let events = rec.events.lock().unwrap();
        assert_eq!(*events, vec!["start 1/2 a.pdf", "error 2 bad pdf"]);
    }
}
