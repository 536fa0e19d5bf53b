// tests/extract_property.rs
mod common;
use crate::common::tree_snapshot;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use proptest::prelude::*;

use sidecar::assets::{MemorySource, extract_tree};

type Tree = BTreeMap<PathBuf, Option<Vec<u8>>>;

/// Build a conflict-free tree (no file also used as a directory) from
/// arbitrary path/content pairs, plus the snapshot extraction must produce.
fn build_tree(candidates: Vec<(Vec<String>, Vec<u8>)>) -> (MemorySource, Tree) {
    let mut files: BTreeMap<PathBuf, Vec<u8>> = BTreeMap::new();
    let mut dirs: BTreeSet<PathBuf> = BTreeSet::new();

    for (segments, bytes) in candidates {
        let path: PathBuf = segments.iter().collect();
        let under_a_file = path.ancestors().skip(1).any(|a| files.contains_key(a));
        if under_a_file || dirs.contains(&path) {
            continue;
        }
        for ancestor in path.ancestors().skip(1) {
            if !ancestor.as_os_str().is_empty() {
                dirs.insert(ancestor.to_path_buf());
            }
        }
        files.insert(path, bytes);
    }

    let source = files.iter().fold(MemorySource::new(), |src, (path, bytes)| {
        let key = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        src.with_file(&key, bytes.clone())
    });

    let mut expected: Tree = dirs.into_iter().map(|d| (d, None)).collect();
    expected.extend(files.into_iter().map(|(p, b)| (p, Some(b))));
    (source, expected)
}

fn candidates() -> impl Strategy<Value = Vec<(Vec<String>, Vec<u8>)>> {
    prop::collection::vec(
        (
            prop::collection::vec("[a-c]{1,2}", 1..4),
            prop::collection::vec(any::<u8>(), 0..64),
        ),
        0..12,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn extraction_reproduces_every_tree(candidates in candidates()) {
        let (source, expected) = build_tree(candidates);

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("bundle");
        extract_tree(&source, &dest).unwrap();

        prop_assert_eq!(tree_snapshot(&dest), expected);
    }
}
