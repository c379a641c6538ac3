//! Bundle manifest
//!
//! The manifest (`META-INF/manifest.xml`) records every resource in a bundle
//! with its media type, MD5 checksum and user tags. It is an OASIS manifest
//! document, version 1.2:
//!
//! ```text
//! <manifest:manifest xmlns:manifest="urn:oasis:..." manifest:version="1.2">
//!  <manifest:file-entry manifest:media-type="application/x-krita-resourcebundle" manifest:full-path="/"/>
//!  <manifest:file-entry manifest:media-type="brushes" manifest:full-path="brushes/a.gbr" manifest:md5sum="...">
//!   <manifest:tags>
//!    <manifest:tag>warm</manifest:tag>
//!   </manifest:tags>
//!  </manifest:file-entry>
//! </manifest:manifest>
//! ```
//!
//! The `/` entry describes the bundle directory itself. It is written on every
//! save and discarded on load; it never appears in [`Manifest::entries`].

use crate::core::layout::{
    ATTR_FULL_PATH, ATTR_MD5SUM, ATTR_MEDIA_TYPE, ATTR_VERSION, ATTR_XMLNS, BUNDLE_MIMETYPE,
    ELEM_FILE_ENTRY, ELEM_MANIFEST, ELEM_TAG, ELEM_TAGS, MANIFEST_VERSION, MANIFEST_XMLNS,
    ROOT_ENTRY_PATH,
};
use crate::core::paths::normalize_internal;
use crate::error::{BundleError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One resource record in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// Internal path, unique key (e.g. "brushes/a.gbr")
    pub full_path: String,

    /// Category, the top-level directory name (e.g. "brushes")
    pub media_type: String,

    /// Hex MD5 of the file at last scan
    pub md5sum: String,

    /// User tags, insertion ordered, no duplicates
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ResourceEntry {
    pub fn new(
        full_path: impl Into<String>,
        media_type: impl Into<String>,
        md5sum: impl Into<String>,
    ) -> Self {
        Self {
            full_path: full_path.into(),
            media_type: media_type.into(),
            md5sum: md5sum.into(),
            tags: Vec::new(),
        }
    }

    /// Set tags, dropping repeats
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.clear();
        for tag in tags {
            push_unique(&mut self.tags, tag.into());
        }
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl fmt::Display for ResourceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.full_path)?;
        writeln!(f, "\tmedia-type: {}", self.media_type)?;
        writeln!(f, "\tmd5sum: {}", self.md5sum)?;
        write!(f, "\ttags: {:?}", self.tags)
    }
}

/// Three-way partition of manifest paths against a candidate path set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryDiff {
    /// In both the manifest and the candidates
    pub common: BTreeSet<String>,

    /// In the manifest only
    pub manifest_only: BTreeSet<String>,

    /// In the candidates only
    pub disk_only: BTreeSet<String>,
}

/// In-memory manifest bound to its backing file
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    entries: BTreeMap<String, ResourceEntry>,
}

impl Manifest {
    /// Create an empty manifest backed by `path` (nothing is read)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replace all entries with the content of the backing file
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not well-formed, or its root
    /// element is not a version 1.2 manifest. Entries are left untouched on
    /// failure.
    pub fn load(&mut self) -> Result<()> {
        let xml = fs::read_to_string(&self.path)?;
        self.load_str(&xml)?;
        debug!("Loaded {} manifest entries from {:?}", self.entries.len(), self.path);
        Ok(())
    }

    /// Replace all entries by parsing a manifest document
    pub fn load_str(&mut self, xml: &str) -> Result<()> {
        let parsed = parse_manifest(xml)?;

        self.entries.clear();
        for entry in parsed {
            self.insert_entry(entry);
        }
        Ok(())
    }

    /// Write the whole manifest to the backing file
    ///
    /// Creates the parent directory if needed and overwrites any existing file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.path, self.to_xml()?)?;
        debug!("Saved {} manifest entries to {:?}", self.entries.len(), self.path);
        Ok(())
    }

    /// Serialize to a pretty-printed manifest document
    pub fn to_xml(&self) -> Result<String> {
        let bytes = write_manifest(self.entries.values())?;
        String::from_utf8(bytes).map_err(|e| BundleError::InvalidManifest(e.to_string()))
    }

    /// Insert or replace an entry
    ///
    /// When an entry already exists at the same path, tags stored on it are
    /// carried over onto the new entry (after its own tags, skipping repeats).
    pub fn insert_entry(&mut self, mut entry: ResourceEntry) {
        if let Some(previous) = self.entries.remove(&entry.full_path) {
            for tag in previous.tags {
                push_unique(&mut entry.tags, tag);
            }
        }

        self.entries.insert(entry.full_path.clone(), entry);
    }

    /// Remove an entry, returning whether it existed
    pub fn remove_entry(&mut self, path: &str) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn has_entry(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&ResourceEntry> {
        self.entries.get(path)
    }

    /// Entries in path order
    pub fn entries(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tags of the entry at `path`, `None` if there is no such entry
    pub fn tags(&self, path: &str) -> Option<&[String]> {
        self.entries.get(path).map(|entry| entry.tags.as_slice())
    }

    /// Append a tag to an entry
    ///
    /// # Errors
    ///
    /// `NoEntry` if nothing is stored at `path`, `DuplicateTag` if the entry
    /// already carries `tag` (exact, case-sensitive match).
    pub fn add_tag(&mut self, path: &str, tag: &str) -> Result<()> {
        let entry = self
            .entries
            .get_mut(path)
            .ok_or_else(|| BundleError::NoEntry(path.to_string()))?;

        if entry.has_tag(tag) {
            return Err(BundleError::DuplicateTag {
                path: path.to_string(),
                tag: tag.to_string(),
            });
        }

        entry.tags.push(tag.to_string());
        Ok(())
    }

    /// Remove a tag from an entry
    ///
    /// # Errors
    ///
    /// `NoEntry` if nothing is stored at `path`, `MissingTag` if the entry
    /// does not carry `tag`.
    pub fn remove_tag(&mut self, path: &str, tag: &str) -> Result<()> {
        let entry = self
            .entries
            .get_mut(path)
            .ok_or_else(|| BundleError::NoEntry(path.to_string()))?;

        let index = entry
            .tags
            .iter()
            .position(|t| t == tag)
            .ok_or_else(|| BundleError::MissingTag {
                path: path.to_string(),
                tag: tag.to_string(),
            })?;

        entry.tags.remove(index);
        Ok(())
    }

    /// Partition manifest paths against `candidates`
    ///
    /// ```
    /// use kbundle::core::manifest::{Manifest, ResourceEntry};
    ///
    /// let mut manifest = Manifest::new("META-INF/manifest.xml");
    /// manifest.insert_entry(ResourceEntry::new("brushes/p1.gbr", "brushes", ""));
    /// manifest.insert_entry(ResourceEntry::new("brushes/p2.gbr", "brushes", ""));
    ///
    /// let diff = manifest.compare_entries(["brushes/p2.gbr", "brushes/p3.gbr"]);
    /// assert!(diff.common.contains("brushes/p2.gbr"));
    /// assert!(diff.manifest_only.contains("brushes/p1.gbr"));
    /// assert!(diff.disk_only.contains("brushes/p3.gbr"));
    /// ```
    pub fn compare_entries<I, S>(&self, candidates: I) -> EntryDiff
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let there: BTreeSet<String> = candidates
            .into_iter()
            .map(|path| path.as_ref().to_string())
            .collect();
        let here: BTreeSet<String> = self.entries.keys().cloned().collect();

        EntryDiff {
            common: here.intersection(&there).cloned().collect(),
            manifest_only: here.difference(&there).cloned().collect(),
            disk_only: there.difference(&here).cloned().collect(),
        }
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.values().enumerate() {
            if i > 0 {
                write!(f, "\n\n")?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

fn push_unique(tags: &mut Vec<String>, tag: String) {
    if !tags.contains(&tag) {
        tags.push(tag);
    }
}

fn is_root_entry(full_path: &str) -> bool {
    full_path == ROOT_ENTRY_PATH || full_path == "\\"
}

/// Streaming manifest parser state
#[derive(Default)]
struct ManifestParser {
    root_seen: bool,
    in_tags: bool,
    current: Option<ResourceEntry>,
    tag_text: Option<String>,
    entries: Vec<ResourceEntry>,
}

impl ManifestParser {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<()> {
        let name = e.name();
        let name = name.as_ref();

        if !self.root_seen {
            if name != ELEM_MANIFEST.as_bytes() {
                return Err(BundleError::InvalidManifest(format!(
                    "unexpected root element <{}>",
                    String::from_utf8_lossy(name)
                )));
            }

            let version = attribute(e, ATTR_VERSION)?;
            if version.as_deref() != Some(MANIFEST_VERSION) {
                return Err(BundleError::UnsupportedManifestVersion(version));
            }

            self.root_seen = true;
            return Ok(());
        }

        if name == ELEM_FILE_ENTRY.as_bytes() {
            if self.current.is_some() {
                return Err(BundleError::InvalidManifest(
                    "nested file-entry element".to_string(),
                ));
            }

            let full_path = attribute(e, ATTR_FULL_PATH)?.ok_or_else(|| {
                BundleError::InvalidManifest("file-entry without full-path".to_string())
            })?;
            let media_type = attribute(e, ATTR_MEDIA_TYPE)?.unwrap_or_default();
            let md5sum = attribute(e, ATTR_MD5SUM)?.unwrap_or_default();

            self.current = Some(ResourceEntry::new(full_path, media_type, md5sum));
            if empty {
                self.finish_entry();
            }
        } else if name == ELEM_TAGS.as_bytes() {
            self.in_tags = self.current.is_some() && !empty;
        } else if name == ELEM_TAG.as_bytes() && self.in_tags {
            self.tag_text = Some(String::new());
            if empty {
                self.close(ELEM_TAG.as_bytes());
            }
        }

        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some(buffer) = self.tag_text.as_mut() {
            buffer.push_str(text);
        }
    }

    fn close(&mut self, name: &[u8]) {
        if name == ELEM_TAG.as_bytes() {
            // Tag text is kept verbatim, surrounding whitespace included
            if let (Some(text), Some(entry)) = (self.tag_text.take(), self.current.as_mut()) {
                push_unique(&mut entry.tags, text);
            }
        } else if name == ELEM_TAGS.as_bytes() {
            self.in_tags = false;
        } else if name == ELEM_FILE_ENTRY.as_bytes() {
            self.finish_entry();
        }
    }

    fn finish_entry(&mut self) {
        let Some(mut entry) = self.current.take() else {
            return;
        };
        self.in_tags = false;

        // The bundle directory itself is implied, never stored
        if is_root_entry(&entry.full_path) {
            return;
        }

        // Manifest paths are `/`-separated, but tolerate foreign spellings
        entry.full_path = normalize_internal(&entry.full_path);
        if entry.full_path.is_empty() {
            return;
        }

        self.entries.push(entry);
    }
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    match e.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

/// Parse a manifest document into its resource entries (root entry excluded)
fn parse_manifest(xml: &str) -> Result<Vec<ResourceEntry>> {
    // Whitespace between elements reaches `text` too, which ignores it
    // unless a tag element is open
    let mut reader = Reader::from_str(xml);

    let mut parser = ManifestParser::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => parser.open(&e, false)?,
            Event::Empty(e) => parser.open(&e, true)?,
            Event::End(e) => parser.close(e.name().as_ref()),
            Event::Text(t) => parser.text(&t.unescape()?),
            Event::CData(t) => parser.text(&String::from_utf8_lossy(&t)),
            Event::Eof => break,
            _ => {}
        }
    }

    if !parser.root_seen {
        return Err(BundleError::InvalidManifest(
            "document has no root element".to_string(),
        ));
    }

    Ok(parser.entries)
}

/// Build the manifest document for `entries`, root entry first
fn write_manifest<'a>(entries: impl Iterator<Item = &'a ResourceEntry>) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 1);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new(ELEM_MANIFEST);
    root.push_attribute((ATTR_XMLNS, MANIFEST_XMLNS));
    root.push_attribute((ATTR_VERSION, MANIFEST_VERSION));
    writer.write_event(Event::Start(root))?;

    let mut dir_entry = BytesStart::new(ELEM_FILE_ENTRY);
    dir_entry.push_attribute((ATTR_MEDIA_TYPE, BUNDLE_MIMETYPE));
    dir_entry.push_attribute((ATTR_FULL_PATH, ROOT_ENTRY_PATH));
    writer.write_event(Event::Empty(dir_entry))?;

    for entry in entries {
        let full_path = entry.full_path.replace('\\', "/");

        let mut elem = BytesStart::new(ELEM_FILE_ENTRY);
        elem.push_attribute((ATTR_MEDIA_TYPE, entry.media_type.as_str()));
        elem.push_attribute((ATTR_FULL_PATH, full_path.as_str()));
        elem.push_attribute((ATTR_MD5SUM, entry.md5sum.as_str()));

        if entry.tags.is_empty() {
            writer.write_event(Event::Empty(elem))?;
            continue;
        }

        writer.write_event(Event::Start(elem))?;
        writer.write_event(Event::Start(BytesStart::new(ELEM_TAGS)))?;
        for tag in &entry.tags {
            writer.write_event(Event::Start(BytesStart::new(ELEM_TAG)))?;
            writer.write_event(Event::Text(BytesText::new(tag)))?;
            writer.write_event(Event::End(BytesEnd::new(ELEM_TAG)))?;
        }
        writer.write_event(Event::End(BytesEnd::new(ELEM_TAGS)))?;
        writer.write_event(Event::End(BytesEnd::new(ELEM_FILE_ENTRY)))?;
    }

    writer.write_event(Event::End(BytesEnd::new(ELEM_MANIFEST)))?;

    let mut output = writer.into_inner();
    output.push(b'\n');
    Ok(output)
}
