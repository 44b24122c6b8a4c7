//! Run entry points: one file or a whole directory tree.
//!
//! Files are processed strictly one after another. In single-file mode any
//! failure is fatal and returned as `Err`. In directory mode a failing file
//! is recorded in the [`RunSummary`] and the run moves on; the caller
//! decides what a partial run means via [`RunSummary::into_result`].

use crate::config::{Mode, RunConfig};
use crate::error::{FileError, SqueezeError};
use crate::output::{FileOutcome, FileReport, RunSummary};
use crate::pipeline::engine::{self, CompressionEngine, InvocationRequest};
use crate::pipeline::{discover, finalize, resolve};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Compress according to `config`.
///
/// # Errors
/// Returns `Err(SqueezeError)` for fatal conditions only:
/// - input missing, or of the wrong kind for the mode
/// - single-file input without a `.pdf` extension
/// - Ghostscript cannot be started
/// - any failure of the one file in single-file mode
///
/// The progress callback, if any, hears about a fatal error through
/// [`RunProgressCallback::on_run_failed`](crate::progress::RunProgressCallback::on_run_failed)
/// before it is returned.
pub fn run(config: &RunConfig) -> Result<RunSummary, SqueezeError> {
    let result = execute(config);
    if let (Err(e), Some(cb)) = (&result, &config.progress_callback) {
        cb.on_run_failed(&e.to_string());
    }
    result
}

fn execute(config: &RunConfig) -> Result<RunSummary, SqueezeError> {
    let start = Instant::now();
    info!(
        "Starting {:?} run on {} (preset {})",
        config.mode,
        config.input.display(),
        config.preset
    );

    config.validate_input()?;
    if config.mode == Mode::Single && !resolve::is_pdf(&config.input) {
        return Err(SqueezeError::NotAPdf {
            path: config.input.clone(),
        });
    }
    if config.backup && !config.in_place() {
        warn!("--backup only applies when files are replaced in place; ignoring it");
    }

    let engine = engine::resolve_engine(config)?;
    debug!("Using engine {}", engine.name());

    let files = match config.mode {
        Mode::Single => vec![run_single(engine.as_ref(), config)?],
        Mode::Directory => run_directory(engine.as_ref(), config)?,
    };

    let summary = RunSummary::new(
        config.mode,
        config.preset,
        files,
        start.elapsed().as_millis() as u64,
    );
    info!(
        "Run complete: {} compressed, {} skipped, {} failed in {}ms",
        summary.stats.compressed,
        summary.stats.skipped,
        summary.stats.failed,
        summary.stats.duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(
            summary.stats.total_files,
            summary.stats.compressed,
            summary.stats.failed,
        );
    }

    if config.open_after {
        let single_output = match config.mode {
            Mode::Single => summary.reports().next().map(|r| r.output.as_path()),
            Mode::Directory => None,
        };
        let target = config.open_target(single_output);
        if let Err(e) = finalize::open_path(&target) {
            warn!("{}", e);
        }
    }

    Ok(summary)
}

/// Compress one PDF.
///
/// With `output = None` the compressed file replaces `input` (after an
/// optional backup when `config.backup` is set); otherwise it is written to
/// `output`, whose parent directories are created as needed. An `output`
/// naming the input file itself is treated as in-place.
pub fn compress_file(
    engine: &dyn CompressionEngine,
    input: &Path,
    output: Option<&Path>,
    config: &RunConfig,
) -> Result<FileReport, SqueezeError> {
    match output {
        Some(out) if !same_file(input, out) => compress_to(engine, input, out, config),
        _ => compress_in_place(engine, input, config),
    }
}

fn compress_to(
    engine: &dyn CompressionEngine,
    input: &Path,
    output: &Path,
    config: &RunConfig,
) -> Result<FileReport, SqueezeError> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SqueezeError::OutputWriteFailed {
            path: output.to_path_buf(),
            source: e,
        })?;
    }
    engine::invoke(engine, &request(input, output.to_path_buf(), config))
}

fn compress_in_place(
    engine: &dyn CompressionEngine,
    input: &Path,
    config: &RunConfig,
) -> Result<FileReport, SqueezeError> {
    if !input.is_file() {
        return Err(SqueezeError::InputNotFound {
            path: input.to_path_buf(),
        });
    }
    let scratch = finalize::scratch_dir_for(input)?;
    let file_name = input.file_name().unwrap_or_else(|| "out.pdf".as_ref());
    let staged = scratch.path().join(file_name);

    let mut report = engine::invoke(engine, &request(input, staged.clone(), config))?;

    if config.backup {
        finalize::backup_original(input)?;
    }
    finalize::replace_original(&staged, input)?;
    debug!("Replaced {} in place", input.display());

    report.output = input.to_path_buf();
    Ok(report)
}

fn request(input: &Path, output: PathBuf, config: &RunConfig) -> InvocationRequest {
    InvocationRequest {
        input: input.to_path_buf(),
        output,
        preset: config.preset,
        compatibility_level: config.compatibility_level.clone(),
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn run_single(
    engine: &dyn CompressionEngine,
    config: &RunConfig,
) -> Result<FileOutcome, SqueezeError> {
    let input = &config.input;
    let output = config
        .output
        .as_deref()
        .map(|out| resolve::single_output_path(input, out));

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(1);
        cb.on_file_start(1, 1, input);
    }

    match compress_file(engine, input, output.as_deref(), config) {
        Ok(report) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_file_complete(1, 1, &report);
            }
            Ok(FileOutcome::Compressed(report))
        }
        Err(e) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_file_error(1, 1, input, &e.to_string());
            }
            Err(e)
        }
    }
}

fn run_directory(
    engine: &dyn CompressionEngine,
    config: &RunConfig,
) -> Result<Vec<FileOutcome>, SqueezeError> {
    let root = &config.input;
    let files = match config.output {
        Some(ref out_root) => discover::mirror_tree(root, out_root)?,
        None => discover::list_files(root)?,
    };
    let total = files.len();
    info!("Discovered {} files under {}", total, root.display());

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    let mut outcomes = Vec::with_capacity(total);
    for (i, file) in files.into_iter().enumerate() {
        let index = i + 1;

        if !resolve::is_pdf(&file) {
            debug!("Skipping non-PDF {}", file.display());
            if let Some(ref cb) = config.progress_callback {
                cb.on_file_skipped(index, total, &file);
            }
            outcomes.push(FileOutcome::Skipped { input: file });
            continue;
        }

        let destination = match config.output {
            Some(ref out_root) => Some(resolve::mirrored_path(&file, root, out_root)?),
            None => None,
        };

        if let Some(ref cb) = config.progress_callback {
            cb.on_file_start(index, total, &file);
        }

        match compress_file(engine, &file, destination.as_deref(), config) {
            Ok(report) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_complete(index, total, &report);
                }
                outcomes.push(FileOutcome::Compressed(report));
            }
            // Every remaining file would fail the same way.
            Err(e @ SqueezeError::EngineNotFound { .. }) => return Err(e),
            Err(e) => {
                warn!("{}", e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_error(index, total, &file, &e.to_string());
                }
                let error = FileError::from_fatal(&file, &e);
                let output = destination.unwrap_or_else(|| file.clone());
                outcomes.push(FileOutcome::Failed {
                    input: file,
                    output,
                    error,
                });
            }
        }
    }

    Ok(outcomes)
}
