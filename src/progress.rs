//! Progress-callback trait for per-file batch events.
//!
//! Attach an [`Arc<dyn BatchProgressCallback>`] with
//! [`crate::batch::Batch::progress`] to receive events as the run walks the
//! source folder. The CLI uses it to drive a progress spinner; library
//! callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use extrator_pdf::{BatchProgressCallback, FileRecord};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, record: &FileRecord) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("#{index}: {}", record.summary_line());
//!     }
//! }
//!
//! let cb: Arc<dyn BatchProgressCallback> = Arc::new(CountingCallback {
//!     done: AtomicUsize::new(0),
//! });
//! ```

use crate::engine::Features;
use crate::output::{FileRecord, RunSummary};
use std::path::Path;
use std::sync::Arc;

/// Called by the batch runner as it processes each file.
///
/// Files are processed one at a time, so events arrive in order. All methods
/// have no-op defaults.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the dependency policy is applied, before the walk.
    fn on_run_start(&self, features: &Features, warnings: &[String]) {
        let _ = (features, warnings);
    }

    /// Called before a PDF is read.
    ///
    /// # Arguments
    /// * `index`: 1-based position among the files actually converted
    /// * `pdf`: path relative to the source folder
    fn on_file_start(&self, index: usize, pdf: &Path) {
        let _ = (index, pdf);
    }

    /// Called when a converted file finishes, successfully or not.
    fn on_file_complete(&self, index: usize, record: &FileRecord) {
        let _ = (index, record);
    }

    /// Called for files that are not converted: existing output or an
    /// output-path conflict.
    fn on_file_skipped(&self, record: &FileRecord) {
        let _ = record;
    }

    /// Called once after the aggregate log summary is written.
    fn on_run_complete(&self, summary: &RunSummary) {
        let _ = summary;
    }
}

/// A no-op implementation, the default when no callback is attached.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Shared handle stored by [`crate::batch::Batch`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Outcome;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        skips: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_file_start(&self, _index: usize, _pdf: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _index: usize, _record: &FileRecord) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_skipped(&self, _record: &FileRecord) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn record() -> FileRecord {
        FileRecord {
            pdf: PathBuf::from("a.pdf"),
            relative: PathBuf::from("a.pdf"),
            markdown: PathBuf::from("a.md"),
            log: None,
            outcome: Outcome::Skipped,
            duration_ms: 0,
            stats: None,
            error: None,
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(&Features::default(), &[]);
        cb.on_file_start(1, Path::new("a.pdf"));
        cb.on_file_complete(1, &record());
        cb.on_file_skipped(&record());
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = Arc::new(TrackingCallback::default());
        let cb: ProgressCallback = tracker.clone();

        cb.on_file_start(1, Path::new("a.pdf"));
        cb.on_file_complete(1, &record());
        cb.on_file_skipped(&record());
        cb.on_file_skipped(&record());

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.skips.load(Ordering::SeqCst), 2);
    }
}
