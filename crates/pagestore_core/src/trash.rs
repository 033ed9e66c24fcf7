//! Trash for deleted pages.
//!
//! Deleting a page moves its content file under the trash directory and
//! records a [`TrashEntry`] holding a snapshot of the page. Entries stay
//! until they are restored or purged.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::MoveLog;
use crate::cycle::assert_no_cycles;
use crate::error::{PageStoreError, Result};
use crate::fs::{FileSystem, read_json, write_json_atomic};
use crate::page::Page;
use crate::path_utils::{HOME, sanitize_path, unique_path, unique_restore_path};
use crate::store::PageStore;

/// A deleted page waiting in the trash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashEntry {
    /// Path the page had when it was deleted
    pub original_path: String,
    /// Unique key of this entry; also names the trashed content file
    pub trash_path: String,
    /// Snapshot of the page record
    pub page: Page,
    /// When the page was deleted
    pub deleted_at: DateTime<Utc>,
}

/// Loads and persists `trash.json`
pub struct TrashStore<FS: FileSystem> {
    fs: FS,
    file: PathBuf,
}

impl<FS: FileSystem> TrashStore<FS> {
    /// Create a trash store backed by the JSON file at `file`
    pub fn new(fs: FS, file: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            file: file.into(),
        }
    }

    /// Load all entries in stored order. Unreadable entries are skipped.
    pub fn list(&self) -> Result<Vec<TrashEntry>> {
        let raw: Vec<Value> = read_json(&self.fs, &self.file, Vec::new())?;
        Ok(raw
            .into_iter()
            .enumerate()
            .filter_map(|(i, entry)| match serde_json::from_value::<TrashEntry>(entry) {
                Ok(mut entry) => {
                    entry.page.normalize();
                    Some(entry)
                }
                Err(e) => {
                    log::warn!("Skipping malformed trash entry #{}: {}", i, e);
                    None
                }
            })
            .collect())
    }

    /// Atomically write all entries
    pub fn persist(&self, entries: &[TrashEntry]) -> Result<()> {
        write_json_atomic(&self.fs, &self.file, entries)
    }
}

impl<FS: FileSystem> PageStore<FS> {
    /// Trash entries in stored order
    pub fn list_trash(&self) -> Result<Vec<TrashEntry>> {
        self.trash_store().list()
    }

    /// Move a page to the trash.
    ///
    /// Descendants are left in place; with their parent gone they show up as
    /// roots until it is restored.
    pub fn delete_page(&self, path: &str) -> Result<TrashEntry> {
        let path = sanitize_path(path);
        if path == HOME {
            return Err(PageStoreError::HomeProtected("deleted"));
        }

        let mut pages = self.list_pages()?;
        let index = pages
            .iter()
            .position(|p| p.path == path)
            .ok_or_else(|| PageStoreError::PageNotFound(path.clone()))?;

        let trash = self.trash_store();
        let previous_entries = trash.list()?;
        let trash_content = self.trash_content();

        let deleted_at = Utc::now();
        let candidate = format!("{}_{}", path, deleted_at.timestamp());
        let trash_path = unique_path(&candidate, |c| {
            previous_entries.iter().any(|e| e.trash_path == c) || trash_content.exists(c)
        });

        let mut journal = MoveLog::new();
        let from = self.content().file_for(&path);
        if self.fs().exists(&from) {
            journal.move_file(self.fs(), &from, &trash_content.file_for(&trash_path))?;
        }

        let page = pages.remove(index);
        let entry = TrashEntry {
            original_path: path.clone(),
            trash_path,
            page,
            deleted_at,
        };
        let mut entries = previous_entries.clone();
        entries.push(entry.clone());

        if let Err(e) = trash.persist(&entries) {
            self.rollback(journal);
            return Err(e);
        }
        if let Err(e) = self.repository().persist(&pages) {
            self.rollback(journal);
            if let Err(revert) = trash.persist(&previous_entries) {
                log::warn!("Failed to revert trash list: {}", revert);
            }
            return Err(e);
        }

        log::info!("Moved '{}' to trash as '{}'", path, entry.trash_path);
        Ok(entry)
    }

    /// Bring a trashed page back.
    ///
    /// If its original path has been taken in the meantime the page comes back
    /// as `<path>_restored_1` (or `_2`, …). Only the page itself is restored.
    pub fn restore_page(&self, trash_path: &str) -> Result<Page> {
        let trash_path = trash_path.trim();
        let trash = self.trash_store();
        let previous_entries = trash.list()?;
        let index = previous_entries
            .iter()
            .position(|e| e.trash_path == trash_path)
            .ok_or_else(|| PageStoreError::TrashEntryNotFound(trash_path.to_string()))?;

        let previous_pages = self.list_pages()?;
        let mut entries = previous_entries.clone();
        let entry = entries.remove(index);

        let target = unique_restore_path(&entry.original_path, |c| {
            previous_pages.iter().any(|p| p.path == c)
        });
        let mut page = entry.page;
        page.path = target.clone();
        page.normalize();

        let mut pages = previous_pages.clone();
        pages.push(page.clone());
        assert_no_cycles(&pages)?;

        let mut journal = MoveLog::new();
        let from = self.trash_content().file_for(&entry.trash_path);
        if self.fs().exists(&from) {
            journal.move_file(self.fs(), &from, &self.content().file_for(&target))?;
        }

        if let Err(e) = self.repository().persist(&pages) {
            self.rollback(journal);
            return Err(e);
        }
        if let Err(e) = trash.persist(&entries) {
            self.rollback(journal);
            if let Err(revert) = self.repository().persist(&previous_pages) {
                log::warn!("Failed to revert page list: {}", revert);
            }
            return Err(e);
        }

        log::info!("Restored '{}' as '{}'", entry.trash_path, target);
        Ok(page)
    }

    /// Permanently delete a trash entry and its content file.
    pub fn purge_trash(&self, trash_path: &str) -> Result<TrashEntry> {
        let trash_path = trash_path.trim();
        let trash = self.trash_store();
        let mut entries = trash.list()?;
        let index = entries
            .iter()
            .position(|e| e.trash_path == trash_path)
            .ok_or_else(|| PageStoreError::TrashEntryNotFound(trash_path.to_string()))?;

        let entry = entries.remove(index);
        trash.persist(&entries)?;
        if let Err(e) = self.trash_content().delete(&entry.trash_path) {
            log::warn!("Failed to delete trashed content '{}': {}", entry.trash_path, e);
        }

        log::info!("Purged '{}' from trash", entry.trash_path);
        Ok(entry)
    }
}
