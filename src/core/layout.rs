//! Fixed bundle layout
//!
//! Directory names, document paths and XML names shared by the scanner,
//! the manifest codec and the archive codec.

/// Category directories searched for resources, in scan order.
pub const RESOURCE_DIR_NAMES: &[&str] = &[
    "brushes",
    "gamutmasks",
    "gradients",
    "paintoppresets",
    "palettes",
    "patterns",
    "seexpr_scripts",
    "workspaces",
];

/// MIME type stored in the identifier member and on the root manifest entry.
pub const BUNDLE_MIMETYPE: &str = "application/x-krita-resourcebundle";

/// Name of the uncompressed identifier member, always first in an archive.
pub const MIMETYPE_MEMBER: &str = "mimetype";

/// Internal path of the manifest document.
pub const MANIFEST_PATH: &str = "META-INF/manifest.xml";

/// Internal path of the bundle preview image.
pub const PREVIEW_PATH: &str = "preview.png";

/// Internal path of the bundle metadata document.
pub const META_PATH: &str = "meta.xml";

/// Only supported manifest schema version.
pub const MANIFEST_VERSION: &str = "1.2";

pub const MANIFEST_XMLNS: &str = "urn:oasis:names:tc:opendocument:xmlns:manifest:1.0";

/// Full path of the synthetic root entry.
pub const ROOT_ENTRY_PATH: &str = "/";

// XML element and attribute names
pub const ELEM_MANIFEST: &str = "manifest:manifest";
pub const ELEM_FILE_ENTRY: &str = "manifest:file-entry";
pub const ELEM_TAGS: &str = "manifest:tags";
pub const ELEM_TAG: &str = "manifest:tag";
pub const ATTR_XMLNS: &str = "xmlns:manifest";
pub const ATTR_VERSION: &str = "manifest:version";
pub const ATTR_MEDIA_TYPE: &str = "manifest:media-type";
pub const ATTR_FULL_PATH: &str = "manifest:full-path";
pub const ATTR_MD5SUM: &str = "manifest:md5sum";
