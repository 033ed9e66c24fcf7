//! Cross-link rewriting after pages move.
//!
//! Two kinds of references are rewritten:
//! - `href` attributes pointing at a moved page (absolute URLs on this site,
//!   root-relative paths, or bare page paths)
//! - `data-page-path` attributes, which hold a page path verbatim

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::{Captures, Regex};

use crate::path_utils::replace_prefix;

/// `href="…"` or `href='…'`, only as a whole attribute name
static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(\shref\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// `data-page-path="…"` or `data-page-path='…'`
static DATA_PAGE_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(\sdata-page-path\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Order a `{old → new}` map longest old path first, so `a/b` is tried before `a`.
pub fn ordered_moves(moved: &IndexMap<String, String>) -> Vec<(String, String)> {
    let mut moves: Vec<(String, String)> = moved
        .iter()
        .filter(|(old, new)| old != new)
        .map(|(old, new)| (old.clone(), new.clone()))
        .collect();
    moves.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
    moves
}

/// Rewrites references to moved pages inside HTML bodies.
#[derive(Debug, Clone, Default)]
pub struct LinkRewriter {
    base_path: String,
}

impl LinkRewriter {
    /// Create a rewriter for a site mounted under `base_path` (empty for `/`).
    pub fn new(base_path: &str) -> Self {
        let base = base_path.trim().trim_matches('/');
        Self {
            base_path: if base.is_empty() {
                String::new()
            } else {
                format!("/{}", base)
            },
        }
    }

    /// Rewrite `html` for `moves` (longest old path first).
    ///
    /// Each attribute is rewritten at most once, by the first move that
    /// matches. Returns `None` when nothing changed.
    pub fn rewrite(&self, html: &str, moves: &[(String, String)]) -> Option<String> {
        if moves.is_empty() {
            return None;
        }

        let mut changed = false;

        let html = HREF_RE.replace_all(html, |caps: &Captures| {
            let (value, quote) = quoted_value(caps);
            match self.rewrite_href(value, moves) {
                Some(new_value) => {
                    changed = true;
                    format!("{}{}{}{}", &caps[1], quote, new_value, quote)
                }
                None => caps[0].to_string(),
            }
        });

        let html = DATA_PAGE_PATH_RE.replace_all(&html, |caps: &Captures| {
            let (value, quote) = quoted_value(caps);
            match moves.iter().find(|(old, _)| old == value) {
                Some((_, new)) => {
                    changed = true;
                    format!("{}{}{}{}", &caps[1], quote, new, quote)
                }
                None => caps[0].to_string(),
            }
        });

        changed.then(|| html.into_owned())
    }

    /// Rewrite a single `href` value, or `None` if it does not point at a moved page.
    pub fn rewrite_href(&self, href: &str, moves: &[(String, String)]) -> Option<String> {
        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        let (origin, rest) = split_origin(href)?;

        let split_at = rest.find(['?', '#']).unwrap_or(rest.len());
        let (path, suffix) = rest.split_at(split_at);

        let (leading_slash, path) = match path.strip_prefix('/') {
            Some(stripped) => ("/", stripped),
            None => ("", path),
        };

        // Only absolute paths are mounted under the base path
        let mut base = "";
        let mut path = path;
        if !leading_slash.is_empty() && !self.base_path.is_empty() {
            let mounted = &self.base_path[1..];
            if let Some(rest) = path.strip_prefix(mounted)
                && (rest.is_empty() || rest.starts_with('/'))
            {
                base = mounted;
                path = rest.trim_start_matches('/');
            }
        }

        let (path, trailing_slash) = match path.strip_suffix('/') {
            Some(stripped) => (stripped, "/"),
            None => (path, ""),
        };
        if path.is_empty() {
            return None;
        }

        let replaced = moves
            .iter()
            .find_map(|(old, new)| replace_prefix(path, old, new))?;

        let mut out = String::with_capacity(href.len() + 16);
        out.push_str(origin);
        out.push_str(leading_slash);
        if !base.is_empty() {
            out.push_str(base);
            out.push('/');
        }
        out.push_str(&replaced);
        out.push_str(trailing_slash);
        out.push_str(suffix);
        Some(out)
    }
}

fn quoted_value<'h>(caps: &Captures<'h>) -> (&'h str, char) {
    match caps.get(2) {
        Some(m) => (m.as_str(), '"'),
        None => (caps.get(3).map_or("", |m| m.as_str()), '\''),
    }
}

/// Split an href into its `scheme://host` part and the rest.
///
/// Returns `None` for non-HTTP schemes (`mailto:`, `tel:`, `javascript:`, …).
fn split_origin(href: &str) -> Option<(&str, &str)> {
    if let Some(after) = href.strip_prefix("//") {
        let end = after.find(['/', '?', '#']).map_or(href.len(), |i| i + 2);
        return Some(href.split_at(end));
    }

    let scheme_end = href.find(':');
    let first_delim = href.find(['/', '?', '#']);
    match (scheme_end, first_delim) {
        (Some(colon), delim) if delim.is_none_or(|d| colon < d) => {
            let scheme = &href[..colon];
            if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
                return None;
            }
            let after = href[colon + 1..].strip_prefix("//")?;
            let host_start = colon + 3;
            let end = after
                .find(['/', '?', '#'])
                .map_or(href.len(), |i| host_start + i);
            Some(href.split_at(end))
        }
        _ => Some(("", href)),
    }
}
