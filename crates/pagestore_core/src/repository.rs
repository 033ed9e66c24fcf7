//! The page list (`pages.json`).

use std::collections::HashSet;
use std::path::PathBuf;

use serde_json::Value;

use crate::error::Result;
use crate::fs::{FileSystem, read_json, write_json_atomic};
use crate::page::Page;
use crate::path_utils::{HOME, sanitize_path};

/// Loads and persists the ordered list of page records
pub struct PageRepository<FS: FileSystem> {
    fs: FS,
    file: PathBuf,
}

impl<FS: FileSystem> PageRepository<FS> {
    /// Create a repository backed by the JSON file at `file`
    pub fn new(fs: FS, file: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            file: file.into(),
        }
    }

    /// Load every page.
    ///
    /// Malformed entries (not an object, no `path`) and repeated paths are
    /// dropped. A missing `home` record is created and persisted. Defaults are
    /// filled in, but parent/path disagreements are left exactly as stored.
    pub fn list(&self) -> Result<Vec<Page>> {
        let raw: Vec<Value> = read_json(&self.fs, &self.file, Vec::new())?;

        let mut seen = HashSet::new();
        let mut pages = Vec::with_capacity(raw.len());
        for (i, entry) in raw.into_iter().enumerate() {
            if !entry.is_object() {
                log::warn!("Skipping page entry #{}: not an object", i);
                continue;
            }
            let mut page: Page = match serde_json::from_value(entry) {
                Ok(page) => page,
                Err(e) => {
                    log::warn!("Skipping malformed page entry #{}: {}", i, e);
                    continue;
                }
            };
            page.normalize();
            if page.path.is_empty() {
                log::warn!("Skipping page entry #{}: missing path", i);
                continue;
            }
            if !seen.insert(page.path.clone()) {
                log::warn!("Skipping duplicate page entry for '{}'", page.path);
                continue;
            }
            pages.push(page);
        }

        if !seen.contains(HOME) {
            log::info!("No home page in {}, creating one", self.file.display());
            pages.insert(0, Page::home());
            self.persist(&pages)?;
        }

        Ok(pages)
    }

    /// Find a page by (sanitized) path
    pub fn get(&self, path: &str) -> Result<Option<Page>> {
        let path = sanitize_path(path);
        Ok(self.list()?.into_iter().find(|page| page.path == path))
    }

    /// Write the list atomically, `home` first and the rest sorted by path.
    ///
    /// This is storage order only; display order comes from the tree.
    pub fn persist(&self, pages: &[Page]) -> Result<()> {
        let mut sorted: Vec<&Page> = pages.iter().collect();
        sorted.sort_by(|a, b| {
            b.is_home()
                .cmp(&a.is_home())
                .then_with(|| a.path.cmp(&b.path))
        });
        write_json_atomic(&self.fs, &self.file, &sorted)
    }
}
