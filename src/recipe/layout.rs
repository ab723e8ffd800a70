// src/recipe/layout.rs

//! Snapshot of an installed keg
//!
//! A snapshot lists every path below the prefix with its kind, permission
//! bits and content digest. Two cooks of the same formula from the same
//! sources must produce snapshots with equal [`LayoutSnapshot::digest`].

use crate::error::{Error, Result};
use crate::hash::{sha256, sha256_file};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// File written into every keg by the plate phase
pub const RECEIPT_FILE: &str = "INSTALL_RECEIPT.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

/// One path inside the keg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    /// Path relative to the prefix, `/`-separated
    pub path: String,
    pub kind: EntryKind,
    /// Permission bits (0 where the platform has none)
    pub mode: u32,
    /// Content digest for files, link target for symlinks
    pub content: Option<String>,
}

/// Sorted listing of a keg
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub entries: Vec<LayoutEntry>,
}

#[cfg(unix)]
fn mode_of(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_of(_meta: &fs::Metadata) -> u32 {
    0
}

impl LayoutSnapshot {
    /// Walk `prefix` and record everything below it
    pub fn capture(prefix: &Path) -> Result<Self> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(prefix).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                Error::IoError(format!("Failed to walk {}: {}", prefix.display(), e))
            })?;
            let rel = entry
                .path()
                .strip_prefix(prefix)
                .map_err(|e| Error::IoError(e.to_string()))?;
            let path = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let meta = fs::symlink_metadata(entry.path())?;
            let file_type = meta.file_type();

            let (kind, content) = if file_type.is_symlink() {
                let target = fs::read_link(entry.path())?;
                (EntryKind::Symlink, Some(target.to_string_lossy().into_owned()))
            } else if file_type.is_dir() {
                (EntryKind::Dir, None)
            } else {
                (EntryKind::File, Some(sha256_file(entry.path())?))
            };

            entries.push(LayoutEntry {
                path,
                kind,
                mode: mode_of(&meta),
                content,
            });
        }

        Ok(Self { entries })
    }

    /// Digest over every entry except the install receipt
    pub fn digest(&self) -> String {
        let mut listing = String::new();
        for entry in self.entries.iter().filter(|e| e.path != RECEIPT_FILE) {
            listing.push_str(&format!(
                "{:?} {} {:o} {}\n",
                entry.kind,
                entry.path,
                entry.mode,
                entry.content.as_deref().unwrap_or("-")
            ));
        }
        sha256(listing.as_bytes())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    /// Relative paths of regular files
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::File)
            .map(|e| e.path.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
