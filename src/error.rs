//! Error types for the pdfsqueeze library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SqueezeError`]: **Fatal**: the run cannot proceed at all (input path
//!   missing, wrong kind of path, Ghostscript not installed). Returned as
//!   `Err(SqueezeError)` from the top-level [`crate::compress::run`].
//!
//! * [`FileError`]: **Non-fatal**: a single file in a directory run failed
//!   (engine crashed on it, file vanished mid-run) but every other file is
//!   fine. Stored inside [`crate::output::FileOutcome::Failed`] so a batch
//!   keeps going and reports a summary at the end.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdfsqueeze library.
#[derive(Debug, Error)]
pub enum SqueezeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input path does not exist.
    #[error("Input path not found: '{path}'")]
    InputNotFound { path: PathBuf },

    /// Single-file mode was selected but the input is not a regular file.
    #[error("Input File Does Not Exist: '{path}' is not a regular file")]
    NotAFile { path: PathBuf },

    /// Directory mode was selected but the input is not a directory.
    #[error("Input Folder Does Not Exist: '{path}' is not a directory")]
    NotADirectory { path: PathBuf },

    /// The input file does not carry a `.pdf` extension.
    #[error("Input file is not a PDF: '{path}'")]
    NotAPdf { path: PathBuf },

    /// Compression level outside the preset table.
    #[error("Invalid compression level {0}: expected 0–4")]
    InvalidQuality(u8),

    // ── Engine errors ─────────────────────────────────────────────────────
    /// No Ghostscript executable could be started.
    #[error(
        "Ghostscript executable '{program}' could not be started: {detail}\n\
Install Ghostscript (macOS: `brew install ghostscript`, Debian/Ubuntu: \
`sudo apt install ghostscript`) or point --gs / PDFSQUEEZE_GS at it."
    )]
    EngineNotFound { program: String, detail: String },

    /// Ghostscript ran but exited unsuccessfully.
    #[error("Compression engine failed on '{input}' (exit code {code:?}): {stderr}")]
    EngineFailed {
        input: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    /// Ghostscript exited cleanly but left no usable output.
    #[error("Compression engine produced no output at '{path}'")]
    EmptyOutput { path: PathBuf },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create an output file or directory.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not copy the original to its `_BACKUP` sibling.
    #[error("Failed to back up '{path}': {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not move the compressed file over the original.
    #[error("Failed to replace '{path}' with its compressed version: {source}")]
    ReplaceFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Walking the input tree failed.
    #[error("Failed to walk directory '{path}': {detail}")]
    WalkFailed { path: PathBuf, detail: String },

    /// The platform opener could not be launched or reported failure.
    #[error("Failed to open '{path}': {detail}")]
    OpenFailed { path: PathBuf, detail: String },

    // ── Batch outcome ─────────────────────────────────────────────────────
    /// Some files compressed but at least one failed.
    ///
    /// Returned by [`crate::output::RunSummary::into_result`].
    #[error("{failed}/{total} files failed during compression")]
    PartialFailure {
        compressed: usize,
        failed: usize,
        total: usize,
    },

    /// Every attempted file failed.
    #[error("All {total} files failed.\nFirst error: {first_error}")]
    AllFilesFailed { total: usize, first_error: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal error for a single file in a directory run.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The file disappeared between discovery and compression.
    #[error("{path}: file vanished before compression")]
    Missing { path: PathBuf },

    /// Ghostscript exited with a failure status.
    #[error("{path}: compression engine failed: {detail}")]
    EngineFailed { path: PathBuf, detail: String },

    /// Ghostscript left an empty or missing output file.
    #[error("{path}: compression engine produced no output")]
    EmptyOutput { path: PathBuf },

    /// Any other filesystem failure for this file.
    #[error("{path}: {detail}")]
    Io { path: PathBuf, detail: String },
}

impl FileError {
    /// Demote a fatal error raised while handling `path` to a per-file error.
    pub fn from_fatal(path: impl Into<PathBuf>, err: &SqueezeError) -> Self {
        let path = path.into();
        match err {
            SqueezeError::InputNotFound { .. } | SqueezeError::NotAFile { .. } => {
                FileError::Missing { path }
            }
            SqueezeError::EngineFailed { code, stderr, .. } => FileError::EngineFailed {
                path,
                detail: match code {
                    Some(c) => format!("exit code {c}: {}", stderr.trim()),
                    None => format!("terminated by signal: {}", stderr.trim()),
                },
            },
            SqueezeError::EmptyOutput { .. } => FileError::EmptyOutput { path },
            other => FileError::Io {
                path,
                detail: other.to_string(),
            },
        }
    }
}
