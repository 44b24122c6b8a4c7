//! Post-processing: scratch space, backups, in-place replacement, opening.
//!
//! In-place runs never let Ghostscript write over the file it is reading.
//! The engine writes into a private scratch directory next to the original;
//! only after it succeeded is the original (optionally) backed up and then
//! overwritten. The original is written through, never swapped for a new
//! file: its mode is kept and a symlinked input stays a symlink. The
//! scratch directory is removed when its [`TempDir`] drops, on success and
//! on error alike.

use crate::error::SqueezeError;
use crate::pipeline::resolve::backup_path;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;
use tracing::{debug, info};

/// Create a scratch directory beside `input`, on the same filesystem.
pub fn scratch_dir_for(input: &Path) -> Result<TempDir, SqueezeError> {
    let parent = match input.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    tempfile::Builder::new()
        .prefix(".pdfsqueeze-")
        .tempdir_in(parent)
        .map_err(|e| SqueezeError::OutputWriteFailed {
            path: parent.to_path_buf(),
            source: e,
        })
}

/// Copy `input` to its `_BACKUP` sibling and return the backup path.
pub fn backup_original(input: &Path) -> Result<PathBuf, SqueezeError> {
    let backup = backup_path(input);
    fs::copy(input, &backup).map_err(|e| SqueezeError::BackupFailed {
        path: input.to_path_buf(),
        source: e,
    })?;
    info!("Backed up {} → {}", input.display(), backup.display());
    Ok(backup)
}

/// Overwrite the contents of `original` with those of `compressed`.
///
/// `original` is truncated and rewritten in place; a symlink is followed to
/// its target.
pub fn replace_original(compressed: &Path, original: &Path) -> Result<(), SqueezeError> {
    let replace_failed = |e: io::Error| SqueezeError::ReplaceFailed {
        path: original.to_path_buf(),
        source: e,
    };

    let mut source = File::open(compressed).map_err(replace_failed)?;
    let mut target = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(original)
        .map_err(replace_failed)?;
    let written = io::copy(&mut source, &mut target).map_err(replace_failed)?;
    target.sync_all().map_err(replace_failed)?;
    debug!("Wrote {} bytes through to {}", written, original.display());
    Ok(())
}

/// Open `path` with the desktop's default application.
pub fn open_path(path: &Path) -> Result<(), SqueezeError> {
    let mut command = opener_command(path);
    debug!("Opening {} with {:?}", path.display(), command);

    let status = command
        .stdin(Stdio::null())
        .status()
        .map_err(|e| SqueezeError::OpenFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
    if !status.success() {
        return Err(SqueezeError::OpenFailed {
            path: path.to_path_buf(),
            detail: format!("opener exited with {status}"),
        });
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn opener_command(path: &Path) -> Command {
    let mut c = Command::new("open");
    c.arg(path);
    c
}

#[cfg(windows)]
fn opener_command(path: &Path) -> Command {
    let mut c = Command::new("cmd");
    c.args(["/C", "start", ""]).arg(path);
    c
}

#[cfg(not(any(target_os = "macos", windows)))]
fn opener_command(path: &Path) -> Command {
    let mut c = Command::new("xdg-open");
    c.arg(path);
    c
}
