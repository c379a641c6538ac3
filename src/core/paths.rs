//! Path normalization between host paths and manifest paths
//!
//! Two spellings of a resource location are in play:
//! - **External**: a host path, native separators, absolute or relative to the
//!   working directory (e.g. `/home/me/bundle/brushes/a.gbr`)
//! - **Internal**: relative to the bundle root, always `/`-separated
//!   (e.g. `brushes/a.gbr`). Manifest keys and archive member names use this form.

use std::path::{Component, Path, PathBuf};

/// Converts paths for one bundle root
#[derive(Debug, Clone)]
pub struct BundlePaths {
    root: PathBuf,
}

impl BundlePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Bundle root as given by the caller
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join the bundle root with an internal path using native separators
    ///
    /// # Examples
    ///
    /// ```
    /// use kbundle::core::paths::BundlePaths;
    /// use std::path::Path;
    ///
    /// let paths = BundlePaths::new("/tmp/b");
    /// assert_eq!(
    ///     paths.external_path("brushes/foo.gbr"),
    ///     Path::new("/tmp/b/brushes/foo.gbr")
    /// );
    /// ```
    pub fn external_path(&self, internal: &str) -> PathBuf {
        internal
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// Convert a user-supplied path to its internal form
    ///
    /// If the path, once made absolute, lies under the bundle root the
    /// root-relative remainder is returned. Otherwise the input is taken to
    /// already be internal and is only normalized, so a leading `/` or `./`
    /// is dropped and `\` becomes `/`.
    pub fn internal_path(&self, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();

        let (Some(abs_root), Some(abs_path)) = (absolutize(&self.root), absolutize(path)) else {
            return normalize_internal(&path.to_string_lossy());
        };

        match abs_path.strip_prefix(&abs_root) {
            Ok(relative) => to_internal(relative),
            Err(_) => normalize_internal(&path.to_string_lossy()),
        }
    }
}

/// Normalize an internal path spelling
///
/// Accepts either separator, drops empty and `.` segments and folds `..`
/// into its parent where one exists.
///
/// ```
/// use kbundle::core::paths::normalize_internal;
///
/// assert_eq!(normalize_internal(r"brushes\sub\a.gbr"), "brushes/sub/a.gbr");
/// assert_eq!(normalize_internal("./brushes//x/../a.gbr"), "brushes/a.gbr");
/// ```
pub fn normalize_internal(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ => segments.push(segment),
            },
            _ => segments.push(segment),
        }
    }

    segments.join("/")
}

/// Top-level directory of an internal path, used as the entry media type
pub fn top_level_dir(internal: &str) -> &str {
    internal
        .split('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(internal)
}

/// Join the normal components of a relative host path with `/`
pub(crate) fn to_internal(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Absolute, lexically cleaned form of a path (no filesystem access)
fn absolutize(path: &Path) -> Option<PathBuf> {
    let absolute = std::path::absolute(path).ok()?;

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }

    Some(cleaned)
}
