//! End-to-end bundle workflows: reconcile, tag, pack, unpack

use kbundle::core::checksum::md5_bytes;
use kbundle::core::paths::BundlePaths;
use kbundle::{Bundle, BundleError, Manifest};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;
use zip::{CompressionMethod, ZipArchive};

/// Helper to create a file at an internal path under `root`
fn write(root: &Path, internal: &str, content: &[u8]) {
    let path = BundlePaths::new(root).external_path(internal);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn manifest_path(root: &Path) -> std::path::PathBuf {
    root.join("META-INF").join("manifest.xml")
}

#[test]
fn test_first_update_creates_manifest() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "brushes/a.gbr", b"brush data");

    let mut bundle = Bundle::new(dir.path());
    bundle.load().unwrap();
    bundle.update_manifest().unwrap();

    let entry = bundle.manifest().get("brushes/a.gbr").unwrap();
    assert_eq!(entry.media_type, "brushes");
    assert_eq!(entry.md5sum, md5_bytes(b"brush data"));
    assert!(entry.tags.is_empty());

    // Persisted with the supported schema version
    let xml = fs::read_to_string(manifest_path(dir.path())).unwrap();
    assert!(xml.contains("manifest:version=\"1.2\""));

    let mut reloaded = Manifest::new(manifest_path(dir.path()));
    reloaded.load().unwrap();
    assert_eq!(reloaded.len(), 1);
    assert!(reloaded.has_entry("brushes/a.gbr"));
}

#[test]
fn test_vanished_resource_loses_entry_and_tags() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "brushes/a.gbr", b"a");
    write(dir.path(), "palettes/p.kpl", b"p");

    let mut bundle = Bundle::open(dir.path()).unwrap();
    bundle.update_manifest().unwrap();
    bundle.add_tag("brushes/a.gbr", "favorite").unwrap();

    fs::remove_file(dir.path().join("brushes").join("a.gbr")).unwrap();

    let mut bundle = Bundle::open(dir.path()).unwrap();
    assert_eq!(bundle.tags("brushes/a.gbr").unwrap(), &["favorite".to_string()]);
    bundle.update_manifest().unwrap();

    assert!(!bundle.manifest().has_entry("brushes/a.gbr"));
    assert!(matches!(
        bundle.tags("brushes/a.gbr"),
        Err(BundleError::NoEntry(_))
    ));
}

#[test]
fn test_add_tag_twice() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "brushes/a.gbr", b"a");

    let mut bundle = Bundle::open(dir.path()).unwrap();
    bundle.update_manifest().unwrap();

    bundle.add_tag("brushes/a.gbr", "warm").unwrap();
    assert_eq!(bundle.tags("brushes/a.gbr").unwrap(), &["warm".to_string()]);

    assert!(matches!(
        bundle.add_tag("brushes/a.gbr", "warm"),
        Err(BundleError::DuplicateTag { .. })
    ));
    assert_eq!(bundle.tags("brushes/a.gbr").unwrap(), &["warm".to_string()]);

    // Persisted
    let reopened = Bundle::open(dir.path()).unwrap();
    assert_eq!(reopened.tags("brushes/a.gbr").unwrap(), &["warm".to_string()]);
}

#[test]
fn test_tags_with_whitespace_persist() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "brushes/a.gbr", b"a");

    let mut bundle = Bundle::open(dir.path()).unwrap();
    bundle.update_manifest().unwrap();
    bundle.add_tag("brushes/a.gbr", " warm").unwrap();
    bundle.add_tag("brushes/a.gbr", "warm").unwrap();
    bundle.add_tag("brushes/a.gbr", "  ").unwrap();
    let in_memory = bundle.tags("brushes/a.gbr").unwrap().to_vec();

    let reopened = Bundle::open(dir.path()).unwrap();
    assert_eq!(reopened.tags("brushes/a.gbr").unwrap(), in_memory.as_slice());
    assert_eq!(in_memory, vec![" warm", "warm", "  "]);
}

#[test]
fn test_update_is_idempotent() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "brushes/a.gbr", b"a");
    write(dir.path(), "brushes/sets/b.gbr", b"b");
    write(dir.path(), "workspaces/w.kws", b"w");

    let mut bundle = Bundle::open(dir.path()).unwrap();
    bundle.update_manifest().unwrap();
    bundle.add_tag("workspaces/w.kws", "layout").unwrap();
    let first: Vec<_> = bundle.manifest().entries().cloned().collect();
    let first_xml = fs::read(manifest_path(dir.path())).unwrap();

    let mut bundle = Bundle::open(dir.path()).unwrap();
    let report = bundle.update_manifest().unwrap();
    let second: Vec<_> = bundle.manifest().entries().cloned().collect();

    assert!(report.inserted.is_empty());
    assert!(report.removed.is_empty());
    assert_eq!(report.updated.len(), 3);
    assert_eq!(first, second);
    assert_eq!(fs::read(manifest_path(dir.path())).unwrap(), first_xml);
}

#[test]
fn test_tags_survive_content_change() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "patterns/dots.pat", b"v1");

    let mut bundle = Bundle::open(dir.path()).unwrap();
    bundle.update_manifest().unwrap();
    bundle.add_tag("patterns/dots.pat", "retro").unwrap();

    write(dir.path(), "patterns/dots.pat", b"v2");
    let mut bundle = Bundle::open(dir.path()).unwrap();
    bundle.update_manifest().unwrap();

    let entry = bundle.manifest().get("patterns/dots.pat").unwrap();
    assert_eq!(entry.md5sum, md5_bytes(b"v2"));
    assert_eq!(entry.tags, vec!["retro"]);
}

#[test]
fn test_pack_and_unpack() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "brushes/a.gbr", b"brush");
    write(dir.path(), "gradients/g.ggr", b"gradient");
    write(dir.path(), "preview.png", b"\x89PNG\r\n");
    write(dir.path(), "meta.xml", b"<meta:meta/>");

    let mut bundle = Bundle::open(dir.path()).unwrap();
    bundle.update_manifest().unwrap();

    let out = TempDir::new().unwrap();
    let archive_path = out.path().join("test.bundle");
    bundle.pack(&archive_path).unwrap();

    // Identifier first, stored, exact bytes
    let mut archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
    let mut first = archive.by_index(0).unwrap();
    assert_eq!(first.name(), "mimetype");
    assert_eq!(first.compression(), CompressionMethod::Stored);
    let mut content = Vec::new();
    first.read_to_end(&mut content).unwrap();
    assert_eq!(content, b"application/x-krita-resourcebundle");
    drop(first);
    assert_eq!(archive.len(), 6);

    let target = out.path().join("unpacked");
    let unpacked = Bundle::new(&target);
    unpacked.unpack(&archive_path).unwrap();

    assert!(!target.join("mimetype").exists());
    assert_eq!(
        fs::read(target.join("gradients").join("g.ggr")).unwrap(),
        b"gradient"
    );
    assert_eq!(
        fs::read(manifest_path(&target)).unwrap(),
        fs::read(manifest_path(dir.path())).unwrap()
    );

    // The unpacked tree is itself a loadable bundle
    let reloaded = Bundle::open(&target).unwrap();
    assert_eq!(reloaded.resources(), bundle.resources());
    assert_eq!(reloaded.manifest().len(), 2);
}

#[test]
fn test_pack_requires_auxiliary_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "brushes/a.gbr", b"brush");
    write(dir.path(), "meta.xml", b"<meta:meta/>");

    let mut bundle = Bundle::open(dir.path()).unwrap();
    bundle.update_manifest().unwrap();

    match bundle.pack(dir.path().join("out.bundle")) {
        Err(BundleError::MissingMember(name)) => assert_eq!(name, "preview.png"),
        other => panic!("expected MissingMember, got {:?}", other),
    }
}
