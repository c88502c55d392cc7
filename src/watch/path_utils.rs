// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again. This only helps for paths
///   that still exist; removed files rely on the fast path.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        let s = rel.to_string_lossy().replace('\\', "/");
        return Some(s);
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            let s = rel.to_string_lossy().replace('\\', "/");
            return Some(s);
        }
    }

    None
}

/// Map a file removed from the working directory to its mirror in the
/// temporary build directory: the `root` prefix is replaced by `tmp_dir`.
///
/// A path outside `root` is returned unchanged; [`is_within`] then keeps it
/// from ever being deleted.
pub fn vanished_target(root: &Path, tmp_dir: &Path, removed: &Path) -> PathBuf {
    match removed.strip_prefix(root) {
        Ok(rel) => tmp_dir.join(rel),
        Err(_) => removed.to_path_buf(),
    }
}

/// Deletion guard: true only for paths strictly inside `sandbox`.
///
/// `sandbox` must be absolute and not a filesystem root, and `path` may not
/// climb out through `..`.
pub fn is_within(sandbox: &Path, path: &Path) -> bool {
    if !sandbox.is_absolute() || sandbox.parent().is_none() {
        return false;
    }
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::CurDir))
    {
        return false;
    }
    path != sandbox && path.starts_with(sandbox)
}

/// Delete mirrored copies of vanished files, but only inside `sandbox`.
///
/// Paths outside the sandbox, already-missing paths and failed removals are
/// skipped silently. Returns the number of entries removed.
pub fn remove_within(sandbox: &Path, paths: &[PathBuf]) -> usize {
    let mut removed = 0;

    for path in paths {
        if !is_within(sandbox, path) {
            debug!(?path, ?sandbox, "refusing to delete vanished file outside tmp dir");
            continue;
        }

        let result = match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
            Ok(_) => fs::remove_file(path),
            Err(_) => continue,
        };

        match result {
            Ok(()) => {
                debug!(?path, "removed vanished file from tmp dir");
                removed += 1;
            }
            Err(err) => debug!(?path, error = %err, "failed to remove vanished file"),
        }
    }

    removed
}
