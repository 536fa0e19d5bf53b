// src/assets/extract.rs

use std::fs;
use std::io;
use std::path::{Component, Path};

use anyhow::{Context, Result, bail};
use tracing::debug;

use super::{AssetKind, AssetSource};

/// Copy every entry of `src` below `dest`, preserving relative paths.
///
/// `dest` is created if it does not exist. Directories are created as they
/// are encountered, and files are written byte-for-byte (truncating any
/// existing file). The first I/O failure aborts the walk; files written
/// before it are left in place.
///
/// Returns the number of files written.
pub fn extract_tree(src: &dyn AssetSource, dest: &Path) -> Result<usize> {
    fs::create_dir_all(dest).with_context(|| format!("creating dir {:?}", dest))?;

    let mut files = 0usize;
    for entry in src.entries()? {
        ensure_relative(&entry.path)?;
        let target = dest.join(&entry.path);

        match entry.kind {
            AssetKind::Dir => {
                fs::create_dir_all(&target)
                    .with_context(|| format!("creating dir {:?}", target))?;
            }
            AssetKind::File => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("creating dir {:?}", parent))?;
                }
                let mut reader = src.open_read(&entry.path)?;
                let mut file = fs::File::create(&target)
                    .with_context(|| format!("creating file {:?}", target))?;
                io::copy(&mut reader, &mut file)
                    .with_context(|| format!("writing to file {:?}", target))?;
                files += 1;
            }
        }
    }

    debug!(dest = ?dest, files, "asset tree extracted");
    Ok(files)
}

/// Entries must stay inside the destination root.
fn ensure_relative(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        bail!("asset entry with empty path");
    }
    for component in path.components() {
        if !matches!(component, Component::Normal(_)) {
            bail!("asset path {:?} escapes the extraction root", path);
        }
    }
    Ok(())
}
