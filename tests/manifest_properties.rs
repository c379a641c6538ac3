//! Property-based tests for manifest invariants
//!
//! Uses proptest to check the XML round trip, the tag merge rule and the
//! three-way partition over random manifests.

use kbundle::{Manifest, ResourceEntry};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn internal_path() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["brushes", "gradients", "palettes", "patterns"]),
        prop::collection::vec("[a-z0-9_]{1,8}", 1..3),
        prop::sample::select(vec!["gbr", "ggr", "kpl", "pat"]),
    )
        .prop_map(|(category, segments, ext)| {
            format!("{}/{}.{}", category, segments.join("/"), ext)
        })
}

fn tag() -> impl Strategy<Value = String> {
    (" {0,2}", "[A-Za-z &<>'\"-]{0,12}", " {0,2}")
        .prop_map(|(lead, body, trail)| format!("{}{}{}", lead, body, trail))
}

fn entry() -> impl Strategy<Value = ResourceEntry> {
    (
        internal_path(),
        "[0-9a-f]{32}",
        prop::collection::vec(tag(), 0..4),
    )
        .prop_map(|(path, md5sum, tags)| {
            let media_type = path.split('/').next().unwrap().to_string();
            ResourceEntry::new(path, media_type, md5sum).with_tags(tags)
        })
}

proptest! {
    #[test]
    fn prop_xml_roundtrip(entries in prop::collection::vec(entry(), 0..20)) {
        let mut manifest = Manifest::new("META-INF/manifest.xml");
        for entry in entries {
            manifest.insert_entry(entry);
        }

        let xml = manifest.to_xml().unwrap();
        let mut parsed = Manifest::new("META-INF/manifest.xml");
        parsed.load_str(&xml).unwrap();

        prop_assert!(!parsed.has_entry("/"));
        prop_assert_eq!(
            parsed.entries().collect::<Vec<_>>(),
            manifest.entries().collect::<Vec<_>>()
        );
    }

    #[test]
    fn prop_insert_keeps_existing_tags(
        old_tags in prop::collection::vec("[a-z]{1,6}", 0..5),
        new_tags in prop::collection::vec("[a-z]{1,6}", 0..5),
    ) {
        let mut manifest = Manifest::new("manifest.xml");
        manifest.insert_entry(ResourceEntry::new("brushes/a.gbr", "brushes", "1").with_tags(old_tags.clone()));
        manifest.insert_entry(ResourceEntry::new("brushes/a.gbr", "brushes", "2").with_tags(new_tags.clone()));

        let stored = manifest.tags("brushes/a.gbr").unwrap();
        for tag in old_tags.iter().chain(new_tags.iter()) {
            prop_assert!(stored.contains(tag));
        }

        // No repeats after merging
        let unique: BTreeSet<_> = stored.iter().collect();
        prop_assert_eq!(unique.len(), stored.len());
    }

    #[test]
    fn prop_partition_is_exact(
        known in prop::collection::btree_set(internal_path(), 0..15),
        candidates in prop::collection::btree_set(internal_path(), 0..15),
    ) {
        let mut manifest = Manifest::new("manifest.xml");
        for path in &known {
            manifest.insert_entry(ResourceEntry::new(path.clone(), "brushes", ""));
        }

        let diff = manifest.compare_entries(&candidates);

        prop_assert_eq!(&diff.common, &known.intersection(&candidates).cloned().collect::<BTreeSet<_>>());
        prop_assert_eq!(&diff.manifest_only, &known.difference(&candidates).cloned().collect::<BTreeSet<_>>());
        prop_assert_eq!(&diff.disk_only, &candidates.difference(&known).cloned().collect::<BTreeSet<_>>());
        prop_assert_eq!(diff.common.len() + diff.manifest_only.len(), known.len());
        prop_assert_eq!(diff.common.len() + diff.disk_only.len(), candidates.len());
    }
}
