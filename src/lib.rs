//! # kbundle - Krita Resource Bundle Tooling
//!
//! `kbundle` maintains resource bundles as plain directory trees and packs
//! them into the `.bundle` archives Krita imports:
//!
//! - **Manifest reconciliation**: keeps `META-INF/manifest.xml` in sync with the
//!   files under the category directories (brushes, palettes, gradients, ...)
//! - **Tags**: per-resource tags that survive rebuilds of the manifest
//! - **Pack / unpack**: deterministic ZIP archives with the layout Krita expects
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kbundle::{Bundle, Result};
//!
//! # fn main() -> Result<()> {
//! // Load an existing tree (manifest is optional)
//! let mut bundle = Bundle::open("my-bundle")?;
//!
//! // Add new files, drop vanished ones, rehash the rest
//! let report = bundle.update_manifest()?;
//! println!("{} new resources", report.inserted.len());
//!
//! // Tags are keyed by bundle-relative path
//! bundle.add_tag("brushes/ink.gbr", "favorite")?;
//!
//! // Produce the archive
//! bundle.pack("my-bundle.bundle")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Unpacking
//!
//! ```rust,no_run
//! use kbundle::Bundle;
//!
//! # fn main() -> kbundle::Result<()> {
//! // The target directory does not need to be loaded, or even exist
//! let bundle = Bundle::new("unpacked");
//! bundle.unpack("downloaded.bundle")?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;

pub use crate::core::{
    archive::ArchiveOptions,
    bundle::{Bundle, ReconcileReport},
    manifest::{EntryDiff, Manifest, ResourceEntry},
    paths::BundlePaths,
};
pub use crate::error::{BundleError, Result};
