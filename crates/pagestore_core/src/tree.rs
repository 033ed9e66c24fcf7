//! Page tree construction.
//!
//! The tree is derived from the flat page list on every call: each page is
//! attached under its effective parent when that parent exists, otherwise it
//! is a root. Siblings sort by `(order, path)`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::page::Page;
use crate::path_utils::HOME;

/// Node in the page tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TreeNode {
    /// The page at this node
    pub page: Page,
    /// Child nodes in display order
    pub children: Vec<TreeNode>,
}

/// One step of a breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Breadcrumb {
    /// Page path
    pub path: String,
    /// Navigation label of the page
    pub title: String,
}

/// Build the page forest. Pure: the input is not modified and equal inputs
/// always produce equal output.
///
/// Pages caught in a parent cycle are unreachable from any root and are left out.
pub fn build_tree(pages: &[Page]) -> Vec<TreeNode> {
    let index: HashMap<&str, usize> = pages
        .iter()
        .enumerate()
        .map(|(i, page)| (page.path.as_str(), i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); pages.len()];
    let mut roots = Vec::new();

    for (i, page) in pages.iter().enumerate() {
        let parent = page.effective_parent();
        match index.get(parent) {
            Some(&p) if !parent.is_empty() => children[p].push(i),
            _ => roots.push(i),
        }
    }

    let sort = |ids: &mut Vec<usize>| {
        ids.sort_by(|&a, &b| {
            pages[a]
                .order
                .cmp(&pages[b].order)
                .then_with(|| pages[a].path.cmp(&pages[b].path))
        })
    };
    sort(&mut roots);
    for ids in children.iter_mut() {
        sort(ids);
    }

    roots
        .into_iter()
        .map(|i| build_node(pages, &children, i))
        .collect()
}

fn build_node(pages: &[Page], children: &[Vec<usize>], i: usize) -> TreeNode {
    TreeNode {
        page: pages[i].clone(),
        children: children[i]
            .iter()
            .map(|&c| build_node(pages, children, c))
            .collect(),
    }
}

/// Trail from `home` to the page at `path`, following effective parents.
///
/// Unknown paths yield an empty trail. The walk stops at the first repeated
/// path so a corrupt list cannot loop.
pub fn build_breadcrumbs(pages: &[Page], path: &str) -> Vec<Breadcrumb> {
    let by_path: HashMap<&str, &Page> = pages.iter().map(|p| (p.path.as_str(), p)).collect();

    let mut trail = Vec::new();
    let mut seen = Vec::new();
    let mut current = by_path.get(path).copied();
    while let Some(page) = current {
        if seen.contains(&page.path.as_str()) {
            break;
        }
        seen.push(page.path.as_str());
        trail.push(Breadcrumb {
            path: page.path.clone(),
            title: page.nav_label().to_string(),
        });
        let parent = page.effective_parent();
        current = if parent.is_empty() {
            None
        } else {
            by_path.get(parent).copied()
        };
    }

    if let Some(home) = by_path.get(HOME)
        && !trail.is_empty()
        && !seen.contains(&HOME)
    {
        trail.push(Breadcrumb {
            path: home.path.clone(),
            title: home.nav_label().to_string(),
        });
    }

    trail.reverse();
    trail
}

/// Public URL of a page under the site's base path. `home` maps to the base root.
///
/// # Example
/// ```
/// use pagestore_core::tree::public_url;
///
/// assert_eq!(public_url("", "home"), "/");
/// assert_eq!(public_url("/site/", "shop/mug"), "/site/shop/mug");
/// ```
pub fn public_url(base_path: &str, path: &str) -> String {
    let base = base_path.trim().trim_end_matches('/');
    let base = if base.is_empty() || base.starts_with('/') {
        base.to_string()
    } else {
        format!("/{}", base)
    };

    if path == HOME || path.is_empty() {
        format!("{}/", base)
    } else {
        format!("{}/{}", base, path.trim_matches('/'))
    }
}

/// Render a forest as an indented ASCII tree for diagnostics.
pub fn format_tree(nodes: &[TreeNode]) -> String {
    nodes
        .iter()
        .map(|node| format_tree_node(node, ""))
        .collect()
}

/// Helper function to format a tree node for display
pub fn format_tree_node(node: &TreeNode, prefix: &str) -> String {
    let mut result = String::new();

    result.push_str(node.page.nav_label());
    result.push_str(" (");
    result.push_str(&node.page.path);
    result.push_str(")\n");

    let child_count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == child_count - 1;
        let connector = if is_last_child {
            "└── "
        } else {
            "├── "
        };
        let child_prefix = if is_last_child { "    " } else { "│   " };

        result.push_str(prefix);
        result.push_str(connector);
        result.push_str(&format_tree_node(
            child,
            &format!("{}{}", prefix, child_prefix),
        ));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(path: &str, order: i64) -> Page {
        let mut page = Page::new(path, path.to_uppercase());
        page.order = order;
        page
    }

    fn paths(nodes: &[TreeNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.page.path.as_str()).collect()
    }

    #[test]
    fn test_build_tree_sorts_by_order_then_path() {
        let pages = vec![
            Page::home(),
            page("b", 1),
            page("a", 1),
            page("c", 0),
            page("c/y", 0),
            page("c/x", 0),
        ];

        let tree = build_tree(&pages);
        assert_eq!(paths(&tree), vec!["home", "c", "a", "b"]);
        assert_eq!(paths(&tree[1].children), vec!["c/x", "c/y"]);
    }

    #[test]
    fn test_build_tree_is_deterministic() {
        let pages = vec![
            page("z", 0),
            Page::home(),
            page("z/a", 2),
            page("z/b", 1),
            page("orphan/child", 0),
        ];
        let first = build_tree(&pages);
        let second = build_tree(&pages);
        assert_eq!(first, second);
        // missing parent makes a root
        assert!(paths(&first).contains(&"orphan/child"));
    }

    #[test]
    fn test_build_tree_honours_explicit_parent() {
        let mut contact = page("contact", 0);
        contact.parent = "about".into();
        contact.parent_explicit = true;

        let mut detached = page("about/legacy", 0);
        detached.parent = String::new();
        detached.parent_explicit = true;

        let pages = vec![Page::home(), page("about", 0), contact, detached];
        let tree = build_tree(&pages);

        assert_eq!(paths(&tree), vec!["home", "about", "about/legacy"]);
        assert_eq!(paths(&tree[1].children), vec!["contact"]);
    }

    #[test]
    fn test_build_tree_every_page_reachable_once() {
        let pages = vec![
            Page::home(),
            page("a", 0),
            page("a/b", 0),
            page("a/b/c", 0),
            page("d", 0),
        ];

        fn collect<'a>(nodes: &'a [TreeNode], out: &mut Vec<&'a str>) {
            for node in nodes {
                out.push(&node.page.path);
                collect(&node.children, out);
            }
        }
        let tree = build_tree(&pages);
        let mut seen = Vec::new();
        collect(&tree, &mut seen);
        seen.sort();
        assert_eq!(seen, vec!["a", "a/b", "a/b/c", "d", "home"]);
    }

    #[test]
    fn test_breadcrumbs_start_at_home() {
        let mut team = page("about/team", 0);
        team.menu_title = Some("Team".into());
        let pages = vec![Page::home(), page("about", 0), team];

        let crumbs = build_breadcrumbs(&pages, "about/team");
        let trail: Vec<(&str, &str)> = crumbs
            .iter()
            .map(|c| (c.path.as_str(), c.title.as_str()))
            .collect();
        assert_eq!(
            trail,
            vec![("home", "Home"), ("about", "ABOUT"), ("about/team", "Team")]
        );

        let home_only = build_breadcrumbs(&pages, "home");
        assert_eq!(home_only.len(), 1);
        assert!(build_breadcrumbs(&pages, "missing").is_empty());
    }

    #[test]
    fn test_public_url() {
        assert_eq!(public_url("", "home"), "/");
        assert_eq!(public_url("", "about/team"), "/about/team");
        assert_eq!(public_url("site", "about"), "/site/about");
        assert_eq!(public_url("/site/", "home"), "/site/");
    }

    #[test]
    fn test_format_tree() {
        let pages = vec![Page::home(), page("a", 0), page("a/b", 0), page("a/c", 1)];
        let rendered = format_tree(&build_tree(&pages));
        assert_eq!(
            rendered,
            "Home (home)\nA (a)\n├── A/B (a/b)\n└── A/C (a/c)\n"
        );
    }
}
