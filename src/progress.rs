//! Progress-callback trait for per-file compression events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive events
//! as the driver works through a single file or a directory tree. The CLI
//! uses it to drive a terminal progress bar; the library itself never
//! prints.
//!
//! # Example
//!
//! ```rust
//! use pdfsqueeze::{FileReport, RunConfig, RunProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, report: &FileReport) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{index}/{total}: {}", report.ratio_percent());
//!     }
//! }
//!
//! let config = RunConfig::builder("docs/")
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::FileReport;
use std::path::Path;
use std::sync::Arc;

/// Called by the driver as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `index` is 1-based over the files discovered for
/// the run, non-PDF files included.
pub trait RunProgressCallback: Send + Sync {
    /// Called once, after discovery and before the first file.
    fn on_run_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before the engine is invoked for a file.
    fn on_file_start(&self, index: usize, total: usize, input: &Path) {
        let _ = (index, total, input);
    }

    /// Called when a file was compressed and measured.
    fn on_file_complete(&self, index: usize, total: usize, report: &FileReport) {
        let _ = (index, total, report);
    }

    /// Called for files passed over because they are not PDFs.
    fn on_file_skipped(&self, index: usize, total: usize, input: &Path) {
        let _ = (index, total, input);
    }

    /// Called when a file failed.
    fn on_file_error(&self, index: usize, total: usize, input: &Path, error: &str) {
        let _ = (index, total, input, error);
    }

    /// Called once after every file has been attempted.
    fn on_run_complete(&self, total_files: usize, compressed: usize, failed: usize) {
        let _ = (total_files, compressed, failed);
    }

    /// Called instead of `on_run_complete` when the run stops on a fatal
    /// error, e.g. Ghostscript could not be started.
    fn on_run_failed(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;
