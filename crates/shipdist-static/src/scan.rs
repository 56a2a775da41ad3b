//! Recursive file discovery by name suffix.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::builder::BuildError;

/// Find every file under `root` whose name ends with `suffix`.
///
/// Matching is case-sensitive and applies to the file name only;
/// directories are never returned. Paths come back in traversal order.
pub fn find_files(root: &Path, suffix: &str) -> Result<Vec<PathBuf>, BuildError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| BuildError::walk(root, e))?;

        if entry.file_type().is_dir() {
            continue;
        }

        if entry.file_name().to_string_lossy().ends_with(suffix) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
