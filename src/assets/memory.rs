// src/assets/memory.rs

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

use anyhow::{Result, anyhow};

use super::{AssetEntry, AssetKind, AssetSource};

#[derive(Debug, Clone)]
enum MemoryEntry {
    File(Cow<'static, [u8]>),
    Dir,
}

/// In-memory asset tree.
///
/// Paths use `/` as separator regardless of platform. Parent directories are
/// created implicitly when a file is added.
///
/// ```
/// use sidecar::assets::MemorySource;
///
/// static BIN: &[u8] = b"#!/bin/sh\nexit 0\n";
/// let bundle = MemorySource::new()
///     .with_static_file("agent-bin", BIN)
///     .with_file("web/index.html", "<html></html>");
/// assert_eq!(bundle.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: BTreeMap<PathBuf, MemoryEntry>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from `(path, bytes)` pairs compiled into the binary.
    pub fn from_static(files: &[(&str, &'static [u8])]) -> Self {
        files
            .iter()
            .fold(Self::new(), |src, &(path, bytes)| {
                src.with_static_file(path, bytes)
            })
    }

    pub fn with_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, MemoryEntry::File(Cow::Owned(contents.into())));
        self
    }

    pub fn with_static_file(mut self, path: &str, contents: &'static [u8]) -> Self {
        self.insert(path, MemoryEntry::File(Cow::Borrowed(contents)));
        self
    }

    pub fn with_dir(mut self, path: &str) -> Self {
        self.insert(path, MemoryEntry::Dir);
        self
    }

    /// Number of entries (files and directories).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, path: &str, entry: MemoryEntry) {
        let path = normalize(path);
        if path.as_os_str().is_empty() {
            return;
        }
        let mut parent = path.parent();
        while let Some(dir) = parent {
            if dir.as_os_str().is_empty() {
                break;
            }
            self.entries
                .entry(dir.to_path_buf())
                .or_insert(MemoryEntry::Dir);
            parent = dir.parent();
        }
        self.entries.insert(path, entry);
    }
}

fn normalize(path: &str) -> PathBuf {
    path.split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect()
}

impl AssetSource for MemorySource {
    fn entries(&self) -> Result<Vec<AssetEntry>> {
        Ok(self
            .entries
            .iter()
            .map(|(path, entry)| AssetEntry {
                path: path.clone(),
                kind: match entry {
                    MemoryEntry::File(_) => AssetKind::File,
                    MemoryEntry::Dir => AssetKind::Dir,
                },
            })
            .collect())
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send + '_>> {
        let key: PathBuf = path
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        match self.entries.get(&key) {
            Some(MemoryEntry::File(bytes)) => Ok(Box::new(Cursor::new(&**bytes))),
            Some(MemoryEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }
}
