//! Batch updates from the navigation editor.
//!
//! The editor submits the parent, order and menu title of many pages at once.
//! A page whose parent changes is moved beneath its new parent (its path
//! follows the tree), and everything beneath its old path moves with it.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cycle::assert_no_cycles;
use crate::error::{PageStoreError, Result};
use crate::fs::FileSystem;
use crate::page::Page;
use crate::path_utils::{
    HOME, depth, is_blank, join, leaf_of, parent_of, sanitize_parent, sanitize_path, unique_path,
};
use crate::rename::apply_moves;
use crate::store::PageStore;

/// New navigation placement for one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase", default)]
pub struct NavUpdate {
    /// Page to update
    pub path: String,
    /// New parent path, empty for a root page
    pub parent: String,
    /// New sibling sort key; unchanged when absent
    #[ts(type = "number | null")]
    pub order: Option<i64>,
    /// New menu title; an empty string clears it, absent leaves it unchanged
    pub menu_title: Option<String>,
}

struct Request {
    parent: String,
    order: Option<i64>,
    menu_title: Option<String>,
}

impl<FS: FileSystem> PageStore<FS> {
    /// Apply a batch of navigation updates.
    ///
    /// Unknown pages are skipped and parents that do not exist are treated as
    /// root. Returns the old → new path of every page that moved.
    pub fn update_navigation(&self, updates: &[NavUpdate]) -> Result<IndexMap<String, String>> {
        let mut pages = self.list_pages()?;
        let known: HashSet<String> = pages.iter().map(|p| p.path.clone()).collect();

        let mut requests: IndexMap<String, Request> = IndexMap::new();
        for update in updates {
            if is_blank(&update.path) {
                log::warn!("Navigation update without a page path skipped");
                continue;
            }
            let path = sanitize_path(&update.path);
            let mut parent = sanitize_parent(&update.parent);
            if parent == path {
                return Err(PageStoreError::SelfParent(path));
            }
            if path == HOME && !parent.is_empty() {
                return Err(PageStoreError::HomeProtected("given a parent"));
            }
            if !known.contains(&path) {
                log::warn!("Navigation update for unknown page '{}' skipped", path);
                continue;
            }
            if !parent.is_empty() && !known.contains(&parent) {
                log::warn!(
                    "Parent '{}' of '{}' does not exist, placing it at the root",
                    parent,
                    path
                );
                parent.clear();
            }
            requests.insert(
                path,
                Request {
                    parent,
                    order: update.order,
                    menu_title: update.menu_title.clone(),
                },
            );
        }

        // Pages whose effective parent actually changes
        let reparented: HashMap<String, String> = pages
            .iter()
            .filter(|p| !p.is_home())
            .filter_map(|p| {
                let request = requests.get(&p.path)?;
                (p.effective_parent() != request.parent)
                    .then(|| (p.path.clone(), request.parent.clone()))
            })
            .collect();

        let mut topology = pages.clone();
        for page in topology.iter_mut() {
            if let Some(parent) = reparented.get(&page.path) {
                page.parent = parent.clone();
                page.parent_explicit = true;
            }
        }
        assert_no_cycles(&topology)?;

        let moved = plan_reparent_moves(&pages, &reparented);

        for page in pages.iter_mut() {
            let Some(request) = requests.get(&page.path) else {
                continue;
            };
            if let Some(parent) = reparented.get(&page.path) {
                page.parent = parent.clone();
                page.parent_explicit = true;
            }
            if let Some(order) = request.order {
                page.order = order;
            }
            if let Some(menu_title) = &request.menu_title {
                page.menu_title = Some(menu_title.trim().to_string()).filter(|t| !t.is_empty());
            }
        }
        apply_moves(&mut pages, &moved);

        assert_no_cycles(&pages)?;
        for page in pages.iter_mut() {
            page.normalize();
        }

        // `moved` is already ordered by target depth
        let moves: Vec<(String, String)> = moved
            .iter()
            .map(|(old, new)| (old.clone(), new.clone()))
            .collect();
        self.commit_moves(&pages, &moves)?;

        if !moved.is_empty() {
            log::info!("Navigation update moved {} pages", moved.len());
            self.rewrite_links(&pages, &moved);
        }
        Ok(moved)
    }
}

/// Compute the new path of every page affected by re-parenting.
///
/// A re-parented page becomes `<new parent's final path>/<leaf>`, or a bare
/// leaf at the root. Pages beneath a moved path follow it by prefix. Targets
/// are disambiguated against every existing path and every earlier target.
fn plan_reparent_moves(
    pages: &[Page],
    reparented: &HashMap<String, String>,
) -> IndexMap<String, String> {
    if reparented.is_empty() {
        return IndexMap::new();
    }

    let mut planner = MovePlanner {
        pages: pages.iter().map(|p| p.path.clone()).collect(),
        reparented,
        taken: pages.iter().map(|p| p.path.clone()).collect(),
        resolved: HashMap::new(),
        resolving: HashSet::new(),
    };

    let mut order: Vec<&str> = pages.iter().map(|p| p.path.as_str()).collect();
    order.sort_by(|a, b| depth(a).cmp(&depth(b)).then_with(|| a.cmp(b)));

    let mut moved: Vec<(String, String)> = Vec::new();
    for path in order {
        let target = planner.resolve(path);
        if target != path {
            moved.push((path.to_string(), target));
        }
    }
    moved.sort_by(|a, b| depth(&a.1).cmp(&depth(&b.1)).then_with(|| a.0.cmp(&b.0)));
    moved.into_iter().collect()
}

struct MovePlanner<'a> {
    pages: HashSet<String>,
    reparented: &'a HashMap<String, String>,
    taken: HashSet<String>,
    resolved: HashMap<String, String>,
    resolving: HashSet<String>,
}

impl MovePlanner<'_> {
    /// Where `path` ends up. Works for intermediate segments that are not pages.
    fn resolve(&mut self, path: &str) -> String {
        if let Some(done) = self.resolved.get(path) {
            return done.clone();
        }
        // A path reached again while resolving stays put
        if !self.resolving.insert(path.to_string()) {
            return path.to_string();
        }

        let candidate = match self.reparented.get(path) {
            Some(new_parent) => {
                let new_parent = new_parent.clone();
                let base = if new_parent.is_empty() {
                    String::new()
                } else {
                    self.resolve(&new_parent)
                };
                join(&base, leaf_of(path))
            }
            None => {
                let parent = parent_of(path);
                if parent.is_empty() {
                    path.to_string()
                } else {
                    let base = self.resolve(parent);
                    if base == parent {
                        path.to_string()
                    } else {
                        join(&base, leaf_of(path))
                    }
                }
            }
        };

        let target = if candidate == path || !self.pages.contains(path) {
            candidate
        } else {
            let target = unique_path(&candidate, |c| c != path && self.taken.contains(c));
            self.taken.insert(target.clone());
            target
        };

        self.resolving.remove(path);
        self.resolved.insert(path.to_string(), target.clone());
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::store_with;
    use std::path::Path;

    fn update(path: &str, parent: &str) -> NavUpdate {
        NavUpdate {
            path: path.into(),
            parent: parent.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_reparent_moves_subtree() {
        let (fs, store) = store_with(&[("foo", "Foo"), ("bar", "Bar"), ("bar/child", "Child")]);
        store.set_content_html("bar/child", "<p>child</p>").unwrap();
        store
            .set_content_html("foo", r#"<a href="/bar/child">c</a>"#)
            .unwrap();

        let moved = store.update_navigation(&[update("bar", "foo")]).unwrap();
        assert_eq!(moved.get("bar").map(String::as_str), Some("foo/bar"));
        assert_eq!(
            moved.get("bar/child").map(String::as_str),
            Some("foo/bar/child")
        );

        let bar = store.get_page("foo/bar").unwrap().unwrap();
        assert_eq!(bar.parent, "foo");
        assert!(bar.parent_explicit);
        let child = store.get_page("foo/bar/child").unwrap().unwrap();
        assert_eq!(child.parent, "foo/bar");

        assert!(fs.exists(Path::new("data/content/foo/bar/child.html")));
        assert_eq!(
            store.get_content_html("foo").unwrap(),
            r#"<a href="/foo/bar/child">c</a>"#
        );
    }

    #[test]
    fn test_order_and_menu_title_only() {
        let (_fs, store) = store_with(&[("a", "A"), ("b", "B")]);
        let moved = store
            .update_navigation(&[
                NavUpdate {
                    order: Some(5),
                    menu_title: Some("Alpha".into()),
                    ..update("a", "")
                },
                NavUpdate {
                    menu_title: Some("  ".into()),
                    ..update("b", "")
                },
            ])
            .unwrap();
        assert!(moved.is_empty());

        let a = store.get_page("a").unwrap().unwrap();
        assert_eq!(a.order, 5);
        assert_eq!(a.menu_title.as_deref(), Some("Alpha"));
        assert!(!a.parent_explicit);
        assert_eq!(store.get_page("b").unwrap().unwrap().menu_title, None);
    }

    #[test]
    fn test_move_to_root() {
        let (_fs, store) = store_with(&[("docs", "Docs"), ("docs/guide", "Guide")]);
        let moved = store.update_navigation(&[update("docs/guide", "")]).unwrap();
        assert_eq!(moved.get("docs/guide").map(String::as_str), Some("guide"));

        let guide = store.get_page("guide").unwrap().unwrap();
        assert_eq!(guide.parent, "");
        assert!(guide.parent_explicit);
    }

    #[test]
    fn test_collisions_are_disambiguated() {
        let (_fs, store) = store_with(&[("a", "A"), ("a/x", "AX"), ("b", "B"), ("b/x", "BX")]);
        let moved = store.update_navigation(&[update("a/x", "b")]).unwrap();
        assert_eq!(moved.get("a/x").map(String::as_str), Some("b/x-2"));
        assert!(store.get_page("b/x").unwrap().is_some());
    }

    #[test]
    fn test_nested_moves_in_one_batch() {
        let (_fs, store) = store_with(&[("p", "P"), ("q", "Q"), ("r", "R")]);
        let moved = store
            .update_navigation(&[update("q", "p"), update("r", "q")])
            .unwrap();
        assert_eq!(moved.get("q").map(String::as_str), Some("p/q"));
        assert_eq!(moved.get("r").map(String::as_str), Some("p/q/r"));
        assert_eq!(
            store.get_page("p/q/r").unwrap().unwrap().parent,
            "p/q"
        );
    }

    #[test]
    fn test_unknown_pages_and_parents_are_permissive() {
        let (_fs, store) = store_with(&[("docs", "Docs"), ("docs/a", "A")]);
        let moved = store
            .update_navigation(&[update("ghost", "docs"), update("docs/a", "missing")])
            .unwrap();
        assert_eq!(moved.get("docs/a").map(String::as_str), Some("a"));
        assert!(store.get_page("ghost").unwrap().is_none());
    }

    #[test]
    fn test_validation_and_cycles() {
        let (_fs, store) = store_with(&[("a", "A"), ("b", "B")]);

        assert!(matches!(
            store.update_navigation(&[update("a", "a")]),
            Err(PageStoreError::SelfParent(_))
        ));
        assert!(matches!(
            store.update_navigation(&[update("home", "a")]),
            Err(PageStoreError::HomeProtected(_))
        ));
        assert!(matches!(
            store.update_navigation(&[update("a", "b"), update("b", "a")]),
            Err(PageStoreError::CycleDetected { .. })
        ));
        assert!(store.get_page("a").unwrap().is_some());
        assert!(store.get_page("b").unwrap().is_some());
    }
}
