//! Bundle engine
//!
//! - [`layout`] - fixed directory, file and XML names
//! - [`paths`] - internal / external path conversion
//! - [`scanner`] - resource discovery under the category directories
//! - [`checksum`] - MD5 digests for manifest entries
//! - [`manifest`] - manifest entries, tags and the XML document
//! - [`archive`] - ZIP pack / unpack
//! - [`bundle`] - coordinator tying the above together

pub mod archive;
pub mod bundle;
pub mod checksum;
pub mod layout;
pub mod manifest;
pub mod paths;
pub mod scanner;

pub use bundle::{Bundle, ReconcileReport};
