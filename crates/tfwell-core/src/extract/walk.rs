//! Filesystem traversal for Terraform configuration source.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::{ExtractError, ExtractResult};

/// Extension of configuration-source files.
pub const SOURCE_EXTENSION: &str = "tf";

/// Directories that hold VCS or tool-cache metadata and are never descended into.
const SKIPPED_DIRS: &[&str] = &[".git", ".terraform"];

/// Collect every `.tf` file under `root`, in a stable, name-sorted walk order.
///
/// Skipped directories are pruned before descent, so nothing inside them is
/// visited. Symlinks are not followed into directories, but a symlinked `.tf`
/// that resolves to a regular file is collected. The first unreadable entry
/// aborts the walk, reporting the entry's own path.
pub fn collect_source_paths(root: &Path) -> ExtractResult<Vec<PathBuf>> {
    let mut paths = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e));

    for entry in walker {
        let entry = entry.map_err(|source| {
            let path = source.path().unwrap_or(root).to_path_buf();
            ExtractError::Walk { path, source }
        })?;

        // `Path::is_file` follows symlinks; dangling links fall out here.
        if is_source_file(entry.path()) && entry.path().is_file() {
            paths.push(entry.into_path());
        }
    }

    Ok(paths)
}

pub fn is_source_file(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some(SOURCE_EXTENSION)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    // The walk root itself is always entered, whatever its name.
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}
