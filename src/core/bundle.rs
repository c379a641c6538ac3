//! Bundle coordinator
//!
//! Owns one bundle directory: its manifest, the resource list from the last
//! scan, and the archive settings. Every mutating command requires a
//! successful [`Bundle::load`] first.

use crate::core::archive::{pack_archive, unpack_archive, ArchiveOptions};
use crate::core::checksum::md5_file;
use crate::core::layout::MANIFEST_PATH;
use crate::core::manifest::{Manifest, ResourceEntry};
use crate::core::paths::{top_level_dir, BundlePaths};
use crate::core::scanner::scan_resources;
use crate::error::{BundleError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Paths touched by one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Entries dropped because their file vanished
    pub removed: Vec<String>,

    /// Entries created for new files
    pub inserted: Vec<String>,

    /// Entries rehashed in place (tags kept)
    pub updated: Vec<String>,
}

/// A resource bundle directory
///
/// # Examples
///
/// ```rust,no_run
/// use kbundle::{Bundle, Result};
///
/// # fn main() -> Result<()> {
/// let mut bundle = Bundle::open("my-brushes")?;
/// bundle.update_manifest()?;
/// bundle.add_tag("brushes/ink.gbr", "favorite")?;
/// bundle.pack("my-brushes.bundle")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Bundle {
    paths: BundlePaths,
    manifest: Manifest,
    resources: Vec<String>,
    loaded: bool,
    archive_options: ArchiveOptions,
}

impl Bundle {
    /// Bind to a bundle root without touching the filesystem
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let paths = BundlePaths::new(root);
        let manifest = Manifest::new(paths.external_path(MANIFEST_PATH));

        Self {
            paths,
            manifest,
            resources: Vec::new(),
            loaded: false,
            archive_options: ArchiveOptions::default(),
        }
    }

    /// Bind to a bundle root and load it
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let mut bundle = Self::new(root);
        bundle.load()?;
        Ok(bundle)
    }

    /// Use custom archive settings for [`Bundle::pack`]
    pub fn with_archive_options(mut self, options: ArchiveOptions) -> Self {
        self.archive_options = options;
        self
    }

    pub fn root(&self) -> &Path {
        self.paths.root()
    }

    pub fn paths(&self) -> &BundlePaths {
        &self.paths
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Internal paths found by the last scan, in scan order
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Load the manifest (when present) and scan the tree
    ///
    /// On failure the bundle stays unloaded and refuses mutating commands.
    pub fn load(&mut self) -> Result<()> {
        self.loaded = false;

        if self.manifest.exists() {
            self.manifest.load()?;
        }
        self.scan()?;

        info!(
            "Loaded bundle {:?}: {} manifest entries, {} resources on disk",
            self.root(),
            self.manifest.len(),
            self.resources.len()
        );
        self.loaded = true;
        Ok(())
    }

    /// Rescan the tree, replacing the resource list
    pub fn scan(&mut self) -> Result<()> {
        self.resources = scan_resources(self.paths.root())?;
        Ok(())
    }

    /// Bring the manifest in line with the scanned resources and save it
    ///
    /// Entries for vanished files are dropped with their tags, new files get
    /// fresh entries and every remaining entry is rehashed. The manifest file
    /// is only written once all three passes succeed; in-memory changes made
    /// before a failure are not rolled back.
    ///
    /// # Errors
    ///
    /// `NothingToReconcile` if the last scan found no resources,
    /// `NotAResourceFile` if a listed path is no longer a regular file.
    pub fn update_manifest(&mut self) -> Result<ReconcileReport> {
        self.ensure_loaded()?;
        if self.resources.is_empty() {
            return Err(BundleError::NothingToReconcile);
        }

        let diff = self.manifest.compare_entries(&self.resources);
        let mut report = ReconcileReport::default();

        for path in diff.manifest_only {
            info!("REMOVE: {}", path);
            self.manifest.remove_entry(&path);
            report.removed.push(path);
        }

        for path in diff.disk_only {
            info!("INSERT: {}", path);
            let entry = self.generate_entry(&path)?;
            self.manifest.insert_entry(entry);
            report.inserted.push(path);
        }

        for path in diff.common {
            info!("UPDATE: {}", path);
            let entry = self.generate_entry(&path)?;
            self.manifest.insert_entry(entry);
            report.updated.push(path);
        }

        self.manifest.save()?;
        Ok(report)
    }

    /// Tags on the resource at `path` (external or internal spelling)
    pub fn tags(&self, path: impl AsRef<Path>) -> Result<&[String]> {
        let ipath = self.paths.internal_path(path);
        self.manifest.tags(&ipath).ok_or(BundleError::NoEntry(ipath))
    }

    /// Tag a resource and save the manifest
    pub fn add_tag(&mut self, path: impl AsRef<Path>, tag: &str) -> Result<()> {
        self.ensure_loaded()?;
        let ipath = self.paths.internal_path(path);

        self.manifest.add_tag(&ipath, tag)?;
        debug!("Tagged {} with '{}'", ipath, tag);
        self.manifest.save()
    }

    /// Untag a resource and save the manifest
    pub fn remove_tag(&mut self, path: impl AsRef<Path>, tag: &str) -> Result<()> {
        self.ensure_loaded()?;
        let ipath = self.paths.internal_path(path);

        self.manifest.remove_tag(&ipath, tag)?;
        debug!("Removed tag '{}' from {}", tag, ipath);
        self.manifest.save()
    }

    /// Pack the scanned resources and auxiliary files into an archive
    pub fn pack(&self, archive_path: impl AsRef<Path>) -> Result<()> {
        self.ensure_loaded()?;
        pack_archive(
            &self.paths,
            &self.resources,
            archive_path.as_ref(),
            &self.archive_options,
        )
    }

    /// Extract an archive into the bundle root
    ///
    /// Does not require [`Bundle::load`]; the root is created if missing.
    /// The archive's identifier member is not left on disk.
    pub fn unpack(&self, archive_path: impl AsRef<Path>) -> Result<Vec<String>> {
        unpack_archive(&self.paths, archive_path.as_ref())
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(BundleError::NotLoaded)
        }
    }

    /// Fresh entry for a resource file, hashed from its current content
    fn generate_entry(&self, ipath: &str) -> Result<ResourceEntry> {
        let xpath = self.paths.external_path(ipath);
        if !xpath.is_file() {
            return Err(BundleError::NotAResourceFile(xpath));
        }

        let md5sum = md5_file(&xpath)?;
        Ok(ResourceEntry::new(ipath, top_level_dir(ipath), md5sum))
    }
}
