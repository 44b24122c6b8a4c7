//! Directory discovery and mirroring.
//!
//! [`mirror_tree`] walks the input root, recreates every directory it meets
//! under the output root (empty ones included) and returns the files it
//! found. [`list_files`] does the same walk without touching any output,
//! for in-place runs.
//!
//! Symbolic links are followed. walkdir checks each followed directory
//! against its ancestors, so a link cycle surfaces as an error on that
//! entry; it is logged and skipped and the rest of the tree is still
//! walked.

use crate::error::SqueezeError;
use crate::pipeline::resolve::mirrored_path;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Walk `source_root`, mirror its directory structure under `dest_root`,
/// and return every regular file found, sorted by path.
///
/// If `dest_root` lies inside `source_root` that subtree is not walked, so
/// a second run never picks up the first run's output.
pub fn mirror_tree(source_root: &Path, dest_root: &Path) -> Result<Vec<PathBuf>, SqueezeError> {
    // The root mirror must exist before the walk so nested outputs can be
    // recognised by identity.
    fs::create_dir_all(dest_root).map_err(|e| SqueezeError::OutputWriteFailed {
        path: dest_root.to_path_buf(),
        source: e,
    })?;
    let prune = fs::canonicalize(dest_root).ok();

    let mut created = 0usize;
    let files = walk(source_root, prune.as_deref(), |dir| {
        let target = mirrored_path(dir, source_root, dest_root)?;
        if !target.exists() {
            fs::create_dir_all(&target).map_err(|e| SqueezeError::OutputWriteFailed {
                path: target.clone(),
                source: e,
            })?;
            created += 1;
            debug!("Created {}", target.display());
        }
        Ok(())
    })?;

    debug!(
        "Mirrored {} into {}: {} files, {} new directories",
        source_root.display(),
        dest_root.display(),
        files.len(),
        created
    );
    Ok(files)
}

/// Walk `source_root` and return every regular file found, sorted by path.
pub fn list_files(source_root: &Path) -> Result<Vec<PathBuf>, SqueezeError> {
    walk(source_root, None, |_| Ok(()))
}

fn walk<F>(
    source_root: &Path,
    prune: Option<&Path>,
    mut on_dir: F,
) -> Result<Vec<PathBuf>, SqueezeError>
where
    F: FnMut(&Path) -> Result<(), SqueezeError>,
{
    let mut files = Vec::new();

    let entries = WalkDir::new(source_root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| match prune {
            Some(pruned) if entry.depth() > 0 && entry.file_type().is_dir() => {
                fs::canonicalize(entry.path())
                    .map(|p| p != pruned)
                    .unwrap_or(true)
            }
            _ => true,
        });

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(SqueezeError::WalkFailed {
                    path: source_root.to_path_buf(),
                    detail: err.to_string(),
                });
            }
            Err(err) => {
                if err.loop_ancestor().is_some() {
                    warn!("Skipping symlink loop: {}", err);
                } else {
                    warn!("Skipping unreadable entry: {}", err);
                }
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            on_dir(entry.path())?;
        } else if file_type.is_file() {
            files.push(entry.into_path());
        } else {
            debug!("Ignoring special file {}", entry.path().display());
        }
    }

    files.sort();
    Ok(files)
}
