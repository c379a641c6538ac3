//! Error types for bundle operations

use std::path::PathBuf;
use thiserror::Error;

/// Bundle operation result type
pub type Result<T> = std::result::Result<T, BundleError>;

/// Bundle operation errors
#[derive(Error, Debug)]
pub enum BundleError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest document is not well-formed XML
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Archive container error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Bundle root is missing or not a directory
    #[error("Bundle directory does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    /// A listed resource is not a regular file
    #[error("Not a resource file: {}", .0.display())]
    NotAResourceFile(PathBuf),

    /// Manifest parsed as XML but does not have the expected shape
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Unsupported manifest version: {0:?} (expected \"1.2\")")]
    UnsupportedManifestVersion(Option<String>),

    /// No manifest entry for the given internal path
    #[error("No matching entry in manifest: {0}")]
    NoEntry(String),

    #[error("Resource {path} is already tagged '{tag}'")]
    DuplicateTag { path: String, tag: String },

    #[error("Resource {path} is not tagged '{tag}'")]
    MissingTag { path: String, tag: String },

    /// Reconciliation requested with an empty scan result
    #[error("No resources found to reconcile")]
    NothingToReconcile,

    /// Mutating operation on a bundle that failed (or never ran) `load`
    #[error("Bundle is not loaded")]
    NotLoaded,

    /// Output would need the extended (Zip64) container format
    #[error("Archive too large: {0}")]
    ArchiveTooLarge(String),

    #[error("Not a resource bundle archive: {0}")]
    NotABundleArchive(String),

    /// Auxiliary bundle file required for packing is absent
    #[error("Missing bundle member: {0}")]
    MissingMember(String),
}
