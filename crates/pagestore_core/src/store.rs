//! The page store facade.
//!
//! [`PageStore`] ties the page list, content files, trash and link/image
//! maintenance together. It holds no state besides its filesystem and
//! configuration; every call reloads `pages.json`.
//!
//! The mutating operations live next to their helpers:
//! - [`PageStore::save_page`] in [`crate::rename`]
//! - [`PageStore::update_navigation`] in [`crate::reparent`]
//! - [`PageStore::delete_page`] and friends in [`crate::trash`]

use indexmap::IndexMap;

use crate::config::StoreConfig;
use crate::content::{ContentStore, MoveLog};
use crate::error::{PageStoreError, Result};
use crate::fs::FileSystem;
use crate::images::{GcReport, ImageCollector};
use crate::links::{LinkRewriter, ordered_moves};
use crate::page::Page;
use crate::path_utils::sanitize_path;
use crate::repository::PageRepository;
use crate::trash::TrashStore;
use crate::tree::{self, Breadcrumb, TreeNode};

/// File-backed hierarchical page store
pub struct PageStore<FS: FileSystem> {
    fs: FS,
    config: StoreConfig,
}

impl<FS: FileSystem> PageStore<FS> {
    /// Create a store over `fs` laid out according to `config`
    pub fn new(fs: FS, config: StoreConfig) -> Self {
        Self { fs, config }
    }

    /// Get a reference to the underlying filesystem
    pub fn fs(&self) -> &FS {
        &self.fs
    }

    /// Store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub(crate) fn repository(&self) -> PageRepository<&FS> {
        PageRepository::new(&self.fs, self.config.pages_path())
    }

    pub(crate) fn content(&self) -> ContentStore<&FS> {
        ContentStore::new(&self.fs, self.config.content_root())
    }

    pub(crate) fn trash_content(&self) -> ContentStore<&FS> {
        ContentStore::new(&self.fs, self.config.trash_root())
    }

    pub(crate) fn trash_store(&self) -> TrashStore<&FS> {
        TrashStore::new(&self.fs, self.config.trash_path())
    }

    // ========================================================================
    // Read API
    // ========================================================================

    /// All pages in storage order
    pub fn list_pages(&self) -> Result<Vec<Page>> {
        self.repository().list()
    }

    /// Find a page by path
    pub fn get_page(&self, path: &str) -> Result<Option<Page>> {
        self.repository().get(path)
    }

    /// Body HTML of a page; a page without a content file has an empty body.
    pub fn get_content_html(&self, path: &str) -> Result<String> {
        self.content().read(&sanitize_path(path))
    }

    /// Replace the body HTML of an existing page.
    pub fn set_content_html(&self, path: &str, html: &str) -> Result<()> {
        let path = sanitize_path(path);
        if self.get_page(&path)?.is_none() {
            return Err(PageStoreError::PageNotFound(path));
        }
        self.content().write(&path, html)
    }

    /// The page forest in display order
    pub fn build_tree(&self) -> Result<Vec<TreeNode>> {
        Ok(tree::build_tree(&self.list_pages()?))
    }

    /// Trail from `home` to the page at `path`
    pub fn build_breadcrumbs(&self, path: &str) -> Result<Vec<Breadcrumb>> {
        Ok(tree::build_breadcrumbs(
            &self.list_pages()?,
            &sanitize_path(path),
        ))
    }

    /// Public URL of the page at `path` under the configured base path
    pub fn public_url(&self, path: &str) -> String {
        tree::public_url(&self.config.base_path, &sanitize_path(path))
    }

    // ========================================================================
    // Mutation helpers
    // ========================================================================

    /// Move content files for `moves` (old path, new path) in the given order,
    /// then persist `planned`.
    ///
    /// Pages without a content file are skipped. If a move or the persist
    /// fails, every completed move is undone and the list on disk is unchanged.
    pub(crate) fn commit_moves(&self, planned: &[Page], moves: &[(String, String)]) -> Result<()> {
        let content = self.content();
        let mut journal = MoveLog::new();

        for (old, new) in moves {
            let from = content.file_for(old);
            if !self.fs.exists(&from) {
                log::debug!("No content file for '{}', nothing to move", old);
                continue;
            }
            let to = content.file_for(new);
            if let Err(e) = journal.move_file(&self.fs, &from, &to) {
                self.rollback(journal);
                return Err(e);
            }
        }

        if let Err(e) = self.repository().persist(planned) {
            self.rollback(journal);
            return Err(e);
        }
        Ok(())
    }

    pub(crate) fn rollback(&self, journal: MoveLog) {
        if journal.is_empty() {
            return;
        }
        let total = journal.moves().len();
        let failed = journal.rollback(&self.fs);
        if failed > 0 {
            log::warn!("Rollback incomplete: {} of {} moves not undone", failed, total);
        } else {
            log::debug!("Rolled back {} file moves", total);
        }
    }

    /// Rewrite links in every page body after the moves in `moved`.
    ///
    /// Returns the paths of the pages whose body changed. Failures on a single
    /// page are logged and skipped.
    pub(crate) fn rewrite_links(&self, pages: &[Page], moved: &IndexMap<String, String>) -> Vec<String> {
        let moves = ordered_moves(moved);
        if moves.is_empty() {
            return Vec::new();
        }

        let rewriter = LinkRewriter::new(&self.config.base_path);
        let content = self.content();
        let mut rewritten = Vec::new();

        for page in pages {
            let html = match content.read(&page.path) {
                Ok(html) => html,
                Err(e) => {
                    log::warn!("Skipping link rewrite for '{}': {}", page.path, e);
                    continue;
                }
            };
            let Some(updated) = rewriter.rewrite(&html, &moves) else {
                continue;
            };
            match content.write(&page.path, &updated) {
                Ok(()) => rewritten.push(page.path.clone()),
                Err(e) => log::warn!("Failed to rewrite links in '{}': {}", page.path, e),
            }
        }

        if !rewritten.is_empty() {
            log::info!("Rewrote links in {} pages", rewritten.len());
        }
        rewritten
    }

    /// Remove images referenced by neither a page body nor a trashed body.
    ///
    /// Skipped (returns `None`) when disabled in the config or when any body
    /// cannot be read, since a missing body would make its images look unused.
    pub(crate) fn collect_images(&self, pages: &[Page]) -> Option<GcReport> {
        if !self.config.gc_images {
            return None;
        }

        let trashed = match self.list_trash() {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Skipping image cleanup, cannot read trash: {}", e);
                return None;
            }
        };

        let content = self.content();
        let mut bodies = Vec::with_capacity(pages.len() + trashed.len());
        for page in pages {
            match content.read(&page.path) {
                Ok(html) => bodies.push(html),
                Err(e) => {
                    log::warn!("Skipping image cleanup, cannot read '{}': {}", page.path, e);
                    return None;
                }
            }
        }

        let trash_content = self.trash_content();
        for entry in &trashed {
            match trash_content.read(&entry.trash_path) {
                Ok(html) => bodies.push(html),
                Err(e) => {
                    log::warn!(
                        "Skipping image cleanup, cannot read trashed '{}': {}",
                        entry.trash_path,
                        e
                    );
                    return None;
                }
            }
        }

        let collector = ImageCollector::new(
            &self.fs,
            self.config.images_root(),
            &self.config.base_path,
            &self.config.images_url_prefix,
        );
        let report = collector.collect_garbage(&bodies);
        if !report.is_empty() {
            log::info!(
                "Image cleanup removed {} files and {} directories",
                report.removed_files.len(),
                report.removed_dirs.len()
            );
        }
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;
    use crate::test_utils::{FailingFileSystem, store_with};
    use std::path::{Path, PathBuf};

    #[test]
    fn test_fresh_store_has_home() {
        let store = PageStore::new(InMemoryFileSystem::new(), StoreConfig::new(PathBuf::from("data")));
        let tree = store.build_tree().unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree[0].page.is_home());
        assert_eq!(store.public_url("home"), "/");
    }

    #[test]
    fn test_content_roundtrip_requires_page() {
        let (fs, store) = store_with(&[("about", "About")]);
        store.set_content_html("about", "<p>hi</p>").unwrap();
        assert_eq!(store.get_content_html("/about/").unwrap(), "<p>hi</p>");
        assert!(fs.exists(Path::new("data/content/about.html")));

        assert!(matches!(
            store.set_content_html("ghost", "x"),
            Err(PageStoreError::PageNotFound(_))
        ));
        assert_eq!(store.get_content_html("ghost").unwrap(), "");
    }

    #[test]
    fn test_commit_moves_rolls_back_on_failed_move() {
        let fs = FailingFileSystem::new();
        fs.write_file(Path::new("data/content/a.html"), "a").unwrap();
        fs.write_file(Path::new("data/content/a/x.html"), "x").unwrap();
        fs.fail_moves_to("data/content/b/x.html");
        let store = PageStore::new(&fs, StoreConfig::new(PathBuf::from("data")));

        let moves = vec![
            ("a".to_string(), "b".to_string()),
            ("a/x".to_string(), "b/x".to_string()),
        ];
        let err = store.commit_moves(&[Page::home()], &moves).unwrap_err();
        assert!(matches!(err, PageStoreError::FileMove { .. }));

        assert!(fs.exists(Path::new("data/content/a.html")));
        assert!(fs.exists(Path::new("data/content/a/x.html")));
        assert!(!fs.exists(Path::new("data/content/b.html")));
        assert!(!fs.exists(Path::new("data/pages.json")));
    }

    #[test]
    fn test_rewrite_links_reports_changed_pages() {
        let (_fs, store) = store_with(&[("a", "A"), ("b", "B"), ("c", "C")]);
        store.set_content_html("b", r#"<a href="/a">A</a>"#).unwrap();
        store.set_content_html("c", "<p>none</p>").unwrap();

        let mut moved = IndexMap::new();
        moved.insert("a".to_string(), "z".to_string());
        let pages = store.list_pages().unwrap();
        assert_eq!(store.rewrite_links(&pages, &moved), vec!["b".to_string()]);
        assert_eq!(store.get_content_html("b").unwrap(), r#"<a href="/z">A</a>"#);
    }
}
