//! Resource discovery
//!
//! Walks the category directories directly under a bundle root and collects
//! every visible regular file as an internal path.

use crate::core::layout::RESOURCE_DIR_NAMES;
use crate::core::paths::to_internal;
use crate::error::{BundleError, Result};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Dotfiles and dot-directories are never bundle content
fn is_visible(entry: &DirEntry) -> bool {
    !entry.file_name().to_string_lossy().starts_with('.')
}

/// Scan a bundle root for resource files
///
/// Categories are visited in [`RESOURCE_DIR_NAMES`] order and each tree is
/// walked in file-name order, so the result is stable for an unchanged tree.
/// Missing categories are skipped. Fails only when `root` is not a directory.
pub fn scan_resources(root: &Path) -> Result<Vec<String>> {
    if !root.is_dir() {
        return Err(BundleError::RootNotFound(root.to_path_buf()));
    }

    let mut resources = Vec::new();

    for dir_name in RESOURCE_DIR_NAMES {
        let category = root.join(dir_name);
        if !category.is_dir() {
            continue;
        }

        let before = resources.len();
        let walker = WalkDir::new(&category)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(is_visible);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {:?}: {}", category, e);
                    continue;
                }
            };

            // Follows a symlink to its target, so linked resource files count
            if !entry.path().is_file() {
                continue;
            }

            // walkdir yields paths prefixed by the root it was given
            if let Ok(relative) = entry.path().strip_prefix(root) {
                resources.push(to_internal(relative));
            }
        }

        debug!("Found {} resources in {}", resources.len() - before, dir_name);
    }

    Ok(resources)
}
