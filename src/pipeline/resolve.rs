//! Output path resolution.
//!
//! Paths are handled as [`Path`] components rather than strings, so a
//! source root whose name reappears deeper in the tree (`in/a/in/b.pdf`)
//! still maps to exactly one destination.

use crate::error::SqueezeError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix inserted before the extension of backup copies.
pub const BACKUP_SUFFIX: &str = "_BACKUP";

/// True if the path carries a `.pdf` extension, in any letter case.
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Output path for single-file mode.
///
/// If the output's file name ends in `.pdf` (ignoring case) it is used
/// verbatim. Otherwise it names a directory and the input's file name is
/// appended.
pub fn single_output_path(input: &Path, out: &Path) -> PathBuf {
    let names_a_file = out
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase().ends_with(".pdf"))
        .unwrap_or(false);

    if names_a_file {
        return out.to_path_buf();
    }
    match input.file_name() {
        Some(name) => out.join(name),
        None => out.to_path_buf(),
    }
}

/// Destination of `file` when `source_root` is mirrored under `dest_root`.
pub fn mirrored_path(
    file: &Path,
    source_root: &Path,
    dest_root: &Path,
) -> Result<PathBuf, SqueezeError> {
    let relative = file
        .strip_prefix(source_root)
        .map_err(|_| SqueezeError::WalkFailed {
            path: file.to_path_buf(),
            detail: format!("not under input root '{}'", source_root.display()),
        })?;

    if relative.as_os_str().is_empty() {
        Ok(dest_root.to_path_buf())
    } else {
        Ok(dest_root.join(relative))
    }
}

/// `report.pdf` → `report_BACKUP.pdf`, keeping the extension's case.
pub fn backup_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let mut name = OsString::from(stem);
    name.push(BACKUP_SUFFIX);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    input.with_file_name(name)
}
