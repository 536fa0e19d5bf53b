// src/assets/mod.rs

//! Read-only asset trees (the agent bundle) and their extraction onto disk.
//!
//! - [`AssetSource`] abstracts "a tree of directories and regular files".
//! - [`DirSource`] reads a tree that already lives on disk (e.g. a build
//!   output directory handed to the binary with `--bundle`).
//! - [`MemorySource`] holds a tree in memory, typically built from
//!   `include_bytes!` data compiled into the host binary, and in tests.
//! - [`extract_tree`] materializes any source at a destination root.

use std::fmt::Debug;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod extract;
pub mod memory;

pub use extract::extract_tree;
pub use memory::MemorySource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Dir,
    File,
}

/// One node of an asset tree. `path` is relative to the tree root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub path: PathBuf,
    pub kind: AssetKind,
}

/// Abstract read-only asset tree.
pub trait AssetSource: Send + Sync + Debug {
    /// Every entry below the root. Parents are listed before their children.
    fn entries(&self) -> Result<Vec<AssetEntry>>;

    /// Open a file entry for reading.
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send + '_>>;
}

/// Asset tree backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn walk(&self, rel: &Path, out: &mut Vec<AssetEntry>) -> Result<()> {
        let dir = self.root.join(rel);
        let mut children = Vec::new();
        for entry in fs::read_dir(&dir).with_context(|| format!("reading dir {:?}", dir))? {
            let entry = entry.with_context(|| format!("reading dir {:?}", dir))?;
            children.push(entry.file_name());
        }
        children.sort();

        for name in children {
            let child_rel = rel.join(&name);
            let child = self.root.join(&child_rel);
            // Follows symlinks; anything that is neither a dir nor a regular
            // file is not part of a bundle.
            let meta = fs::metadata(&child).with_context(|| format!("stat {:?}", child))?;
            if meta.is_dir() {
                out.push(AssetEntry {
                    path: child_rel.clone(),
                    kind: AssetKind::Dir,
                });
                self.walk(&child_rel, out)?;
            } else if meta.is_file() {
                out.push(AssetEntry {
                    path: child_rel,
                    kind: AssetKind::File,
                });
            }
        }
        Ok(())
    }
}

impl AssetSource for DirSource {
    fn entries(&self) -> Result<Vec<AssetEntry>> {
        let mut out = Vec::new();
        self.walk(Path::new(""), &mut out)?;
        Ok(out)
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send + '_>> {
        let full = self.root.join(path);
        let file = fs::File::open(&full).with_context(|| format!("opening file {:?}", full))?;
        Ok(Box::new(file))
    }
}
