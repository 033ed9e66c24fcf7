//! Saving pages, including renames that cascade to descendants.
//!
//! A rename moves the page and every page whose path lies beneath the old
//! path, moves their content files, fixes `parent` fields pointing at moved
//! pages and finally rewrites links in all page bodies.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cycle::assert_no_cycles;
use crate::error::{PageStoreError, Result};
use crate::fs::FileSystem;
use crate::page::{Page, PageType};
use crate::path_utils::{
    HOME, depth, is_blank, is_same_or_within, join, leaf_of, parent_of, replace_prefix, sanitize_parent,
    sanitize_path, unique_path,
};
use crate::store::PageStore;

/// Editor input for creating or updating a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageDraft {
    /// Requested path (sanitized on save)
    pub path: String,
    /// Display title, required
    pub title: String,
    /// Optional navigation label
    pub menu_title: Option<String>,
    /// Page or product
    #[serde(rename = "type")]
    pub page_type: PageType,
    /// Price, used for products only
    pub price: Option<f64>,
    /// Explicit parent; `None` keeps a previously explicit parent or derives one from the path
    pub parent: Option<String>,
    /// Sibling sort key; new pages default to the end of their siblings
    pub order: Option<i64>,
    /// Presentation flag
    pub layout_full_width: bool,
    /// Presentation keyword
    pub layout_block_align: String,
    /// New body HTML, if it changed
    pub body_html: Option<String>,
}

/// Result of [`PageStore::save_page`]
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    /// The page as stored
    pub page: Page,
    /// Old path to new path for every page moved by a rename
    pub moved: IndexMap<String, String>,
}

impl<FS: FileSystem> PageStore<FS> {
    /// Create or update a page.
    ///
    /// With `old_path` set to a different path the page is renamed, taking its
    /// descendants along. Nothing is written if validation or the cycle check
    /// fails, and a failed file move leaves both files and metadata as they were.
    pub fn save_page(&self, draft: PageDraft, old_path: Option<&str>) -> Result<SaveOutcome> {
        if is_blank(&draft.path) {
            return Err(PageStoreError::InvalidPath {
                path: draft.path,
                message: "no usable characters".to_string(),
            });
        }
        let path = sanitize_path(&draft.path);
        let old_path = old_path
            .filter(|p| !p.trim().is_empty())
            .map(sanitize_path);
        let renaming_from = old_path.clone().filter(|old| *old != path);

        let title = draft.title.trim();
        if title.is_empty() {
            return Err(PageStoreError::EmptyTitle);
        }
        if let Some(old) = &renaming_from
            && (old == HOME || path == HOME)
        {
            return Err(PageStoreError::HomeProtected("renamed"));
        }
        if let Some(old) = &renaming_from
            && is_same_or_within(&path, old)
        {
            return Err(PageStoreError::InvalidPath {
                path,
                message: format!("cannot move '{}' beneath itself", old),
            });
        }

        let requested_parent = draft.parent.as_deref().map(sanitize_parent);
        if let Some(parent) = &requested_parent {
            if path == HOME && !parent.is_empty() {
                return Err(PageStoreError::HomeProtected("given a parent"));
            }
            if *parent == path {
                return Err(PageStoreError::SelfParent(path));
            }
        }

        let mut pages = self.list_pages()?;
        let current = old_path.clone().unwrap_or_else(|| path.clone());
        let existing = pages.iter().position(|p| p.path == current);
        if old_path.is_some() && existing.is_none() {
            return Err(PageStoreError::PageNotFound(current));
        }
        let taken = pages.iter().any(|p| p.path == path);
        if taken && (renaming_from.is_some() || old_path.is_none()) {
            return Err(PageStoreError::DuplicatePath(path));
        }
        let previous = existing.map(|i| pages[i].clone());

        let (parent, parent_explicit) = match requested_parent {
            Some(parent) => (parent, true),
            None => match &previous {
                Some(prev) if prev.parent_explicit => (prev.parent.clone(), true),
                _ => (parent_of(&path).to_string(), false),
            },
        };

        let order = draft
            .order
            .or_else(|| previous.as_ref().map(|p| p.order))
            .unwrap_or_else(|| next_sibling_order(&pages, &parent, parent_explicit, &path));

        let mut page = Page {
            path: path.clone(),
            title: title.to_string(),
            menu_title: draft.menu_title,
            page_type: draft.page_type,
            price: draft.price,
            parent,
            parent_explicit,
            order,
            layout_full_width: draft.layout_full_width,
            layout_block_align: draft.layout_block_align,
        };
        page.normalize();

        let moved = match &renaming_from {
            Some(old) => plan_subtree_move(&pages, old, &path),
            None => IndexMap::new(),
        };
        apply_moves(&mut pages, &moved);

        match existing {
            Some(i) => pages[i] = page.clone(),
            None => pages.push(page.clone()),
        }
        assert_no_cycles(&pages)?;

        let moves: Vec<(String, String)> = moved
            .iter()
            .map(|(old, new)| (old.clone(), new.clone()))
            .collect();
        self.commit_moves(&pages, &moves)?;

        let content = self.content();
        match &draft.body_html {
            Some(html) => content.write(&path, html)?,
            None if previous.is_none() && !content.exists(&path) => content.write(&path, "")?,
            None => {}
        }

        if !moved.is_empty() {
            log::info!("Renamed '{}' to '{}' ({} pages moved)", current, path, moved.len());
            self.rewrite_links(&pages, &moved);
        }
        self.collect_images(&pages);

        Ok(SaveOutcome { page, moved })
    }
}

/// One past the highest order among the future siblings of `path`.
fn next_sibling_order(pages: &[Page], parent: &str, parent_explicit: bool, path: &str) -> i64 {
    let parent = if parent_explicit || !parent.is_empty() {
        parent
    } else {
        parent_of(path)
    };
    pages
        .iter()
        .filter(|p| !p.is_home() && p.effective_parent() == parent)
        .map(|p| p.order)
        .max()
        .map_or(0, |max| max + 1)
}

/// Map every page at or beneath `old` to its place beneath `new`.
///
/// Entries are ordered shallow-first. A target already in use gets a `-2`,
/// `-3`, … suffix, and pages below a renamed target follow it.
pub(crate) fn plan_subtree_move(pages: &[Page], old: &str, new: &str) -> IndexMap<String, String> {
    let mut subtree: Vec<&str> = pages
        .iter()
        .map(|p| p.path.as_str())
        .filter(|p| is_same_or_within(p, old))
        .collect();
    subtree.sort_by(|a, b| depth(a).cmp(&depth(b)).then_with(|| a.cmp(b)));

    let mut taken: HashSet<String> = pages.iter().map(|p| p.path.clone()).collect();
    let mut moved: IndexMap<String, String> = IndexMap::new();

    for path in subtree {
        let candidate = if path == old {
            new.to_string()
        } else {
            let parent = parent_of(path);
            match moved.get(parent) {
                Some(new_parent) => join(new_parent, leaf_of(path)),
                None => replace_prefix(path, old, new).unwrap_or_else(|| path.to_string()),
            }
        };
        let target = unique_path(&candidate, |c| taken.contains(c));
        taken.insert(target.clone());
        moved.insert(path.to_string(), target);
    }

    moved
}

/// Rename pages per `moved` and repoint `parent` fields at the new paths.
pub(crate) fn apply_moves(pages: &mut [Page], moved: &IndexMap<String, String>) {
    if moved.is_empty() {
        return;
    }
    for page in pages.iter_mut() {
        let was_moved = match moved.get(&page.path) {
            Some(new_path) => {
                page.path = new_path.clone();
                true
            }
            None => false,
        };

        if let Some(new_parent) = moved.get(&page.parent) {
            page.parent = new_parent.clone();
        } else if was_moved && !page.parent_explicit {
            page.parent = parent_of(&page.path).to_string();
        }
    }
}
