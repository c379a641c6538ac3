//! Bundle archive codec
//!
//! A packed bundle is a classic (non-Zip64) ZIP file with a fixed layout:
//!
//! ```text
//! mimetype                 stored, "application/x-krita-resourcebundle"
//! <resources...>           deflated, in scan order
//! preview.png              deflated
//! META-INF/manifest.xml    deflated
//! meta.xml                 deflated
//! ```
//!
//! Every member carries the same fixed timestamp, so packing an unchanged
//! tree twice produces identical bytes.

use crate::core::layout::{
    BUNDLE_MIMETYPE, MANIFEST_PATH, META_PATH, MIMETYPE_MEMBER, PREVIEW_PATH,
};
use crate::core::paths::BundlePaths;
use crate::error::{BundleError, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// Classic ZIP caps: 16-bit member count, 32-bit sizes and offsets
const MAX_MEMBERS: usize = u16::MAX as usize;
const MAX_CLASSIC_SIZE: u64 = u32::MAX as u64;

/// Auxiliary members appended after the resources, in archive order
pub const AUXILIARY_MEMBERS: [&str; 3] = [PREVIEW_PATH, MANIFEST_PATH, META_PATH];

/// Archive writer configuration
#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    /// Deflate level, `None` for the library default
    pub compression_level: Option<i64>,
}

impl ArchiveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set deflate level
    pub fn with_compression_level(mut self, level: i64) -> Self {
        self.compression_level = Some(level);
        self
    }

    fn stored(&self) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .last_modified_time(DateTime::default())
            .large_file(false)
    }

    fn deflated(&self) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(self.compression_level)
            .last_modified_time(DateTime::default())
            .large_file(false)
    }
}

/// Pack a bundle tree into `archive_path`
///
/// `resources` are internal paths, written in the given order. The three
/// auxiliary files must exist under the root. A partially written archive is
/// removed on failure.
///
/// # Errors
///
/// - `MissingMember` if an auxiliary file is absent
/// - `ArchiveTooLarge` if the result would need Zip64
/// - `Io` / `Zip` on read or write failure
pub fn pack_archive(
    paths: &BundlePaths,
    resources: &[String],
    archive_path: &Path,
    options: &ArchiveOptions,
) -> Result<()> {
    for member in AUXILIARY_MEMBERS {
        if !paths.external_path(member).is_file() {
            return Err(BundleError::MissingMember(member.to_string()));
        }
    }

    let member_count = resources.len() + AUXILIARY_MEMBERS.len() + 1;
    if member_count > MAX_MEMBERS {
        return Err(BundleError::ArchiveTooLarge(format!(
            "{} members exceeds the limit of {}",
            member_count, MAX_MEMBERS
        )));
    }

    info!("Packing {} members into {:?}", member_count, archive_path);

    let result = write_archive(paths, resources, archive_path, options);
    if result.is_err() {
        if let Err(e) = fs::remove_file(archive_path) {
            warn!("Could not remove partial archive {:?}: {}", archive_path, e);
        }
    }
    result
}

fn write_archive(
    paths: &BundlePaths,
    resources: &[String],
    archive_path: &Path,
    options: &ArchiveOptions,
) -> Result<()> {
    let file = File::create(archive_path)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));

    // The identifier must come first and must not be compressed
    zip.start_file(MIMETYPE_MEMBER, options.stored())?;
    zip.write_all(BUNDLE_MIMETYPE.as_bytes())?;

    let members = resources
        .iter()
        .map(String::as_str)
        .chain(AUXILIARY_MEMBERS);

    for member in members {
        let source = paths.external_path(member);
        let size = fs::metadata(&source)?.len();
        if size >= MAX_CLASSIC_SIZE {
            return Err(BundleError::ArchiveTooLarge(format!(
                "{} is {} bytes",
                member, size
            )));
        }

        debug!("Adding {} ({} bytes)", member, size);
        zip.start_file(member, options.deflated())?;
        let mut reader = BufReader::new(File::open(&source)?);
        io::copy(&mut reader, &mut zip)?;
    }

    let writer = zip.finish()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;

    let archive_size = file.metadata()?.len();
    if archive_size >= MAX_CLASSIC_SIZE {
        return Err(BundleError::ArchiveTooLarge(format!(
            "archive is {} bytes",
            archive_size
        )));
    }

    Ok(())
}

/// Check that the first member is the bundle identifier
fn verify_identifier<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<()> {
    if archive.len() == 0 {
        return Err(BundleError::NotABundleArchive("archive is empty".to_string()));
    }

    let mut first = archive.by_index(0)?;
    if first.name() != MIMETYPE_MEMBER {
        debug!("Rejecting archive, first member is {}", first.name());
        return Err(BundleError::NotABundleArchive(format!(
            "first member is {:?}, expected {:?}",
            first.name(),
            MIMETYPE_MEMBER
        )));
    }

    let mut content = Vec::new();
    first.read_to_end(&mut content)?;
    if content != BUNDLE_MIMETYPE.as_bytes() {
        return Err(BundleError::NotABundleArchive(format!(
            "unexpected mimetype {:?}",
            String::from_utf8_lossy(&content)
        )));
    }

    Ok(())
}

/// Extract a bundle archive into the bundle root
///
/// The identifier member is validated, extracted with everything else, then
/// deleted from disk. Returns the names of the extracted files.
pub fn unpack_archive(paths: &BundlePaths, archive_path: &Path) -> Result<Vec<String>> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    verify_identifier(&mut archive)?;

    let members: Vec<String> = archive
        .file_names()
        .filter(|name| *name != MIMETYPE_MEMBER && !name.ends_with('/'))
        .map(str::to_string)
        .collect();

    info!(
        "Unpacking {} members from {:?} into {:?}",
        members.len(),
        archive_path,
        paths.root()
    );
    fs::create_dir_all(paths.root())?;
    archive.extract(paths.root())?;

    let marker = paths.external_path(MIMETYPE_MEMBER);
    if marker.is_file() {
        fs::remove_file(&marker)?;
    }

    Ok(members)
}
