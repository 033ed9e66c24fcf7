//! Page path utilities.
//!
//! Page paths are slash-delimited identifiers such as `about/team`. They are
//! independent of the platform's path separator; content files are derived
//! from them by [`crate::content::ContentStore`].

/// Reserved path of the root page.
pub const HOME: &str = "home";

/// Normalize a user-supplied path into a safe page path.
///
/// Backslashes become slashes and whitespace becomes `-`; every other
/// character outside `[A-Za-z0-9\-_/]` is dropped. Empty segments are
/// removed, so leading, trailing and doubled slashes disappear. An empty
/// result becomes [`HOME`].
///
/// # Example
/// ```
/// use pagestore_core::path_utils::sanitize_path;
///
/// assert_eq!(sanitize_path(" /About Us//team.html "), "About-Us/teamhtml");
/// assert_eq!(sanitize_path("../"), "home");
/// ```
pub fn sanitize_path(raw: &str) -> String {
    let cleaned = clean_segments(raw);
    if cleaned.is_empty() {
        HOME.to_string()
    } else {
        cleaned
    }
}

/// Normalize a parent reference. Unlike [`sanitize_path`], an empty value
/// stays empty and means "no parent".
pub fn sanitize_parent(raw: &str) -> String {
    clean_segments(raw)
}

/// True when `raw` has no usable path characters at all.
pub fn is_blank(raw: &str) -> bool {
    clean_segments(raw).is_empty()
}

fn clean_segments(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter_map(|c| match c {
            '\\' => Some('/'),
            c if c.is_whitespace() => Some('-'),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '/' => Some(c),
            _ => None,
        })
        .collect();

    cleaned
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// The path's prefix up to the last slash, or `""` for a single segment.
pub fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

/// The last segment of the path.
pub fn leaf_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, leaf)| leaf).unwrap_or(path)
}

/// Number of segments in the path.
pub fn depth(path: &str) -> usize {
    if path.is_empty() {
        0
    } else {
        path.split('/').count()
    }
}

/// Join a parent path and a leaf segment. An empty parent yields the bare leaf.
pub fn join(parent: &str, leaf: &str) -> String {
    if parent.is_empty() {
        leaf.to_string()
    } else {
        format!("{}/{}", parent, leaf)
    }
}

/// True when `path` equals `prefix` or lies beneath it.
pub fn is_same_or_within(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Substitute the `old` prefix of `path` with `new`.
///
/// Returns `None` when `path` is neither `old` nor beneath it.
pub fn replace_prefix(path: &str, old: &str, new: &str) -> Option<String> {
    if !is_same_or_within(path, old) {
        return None;
    }
    Some(format!("{}{}", new, &path[old.len()..]))
}

/// Return `candidate`, or the first of `candidate-2`, `candidate-3`, … not taken.
pub fn unique_path(candidate: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(candidate) {
        return candidate.to_string();
    }
    let mut counter = 2;
    loop {
        let next = format!("{}-{}", candidate, counter);
        if !is_taken(&next) {
            return next;
        }
        counter += 1;
    }
}

/// Return `original`, or the first of `original_restored_1`, `_2`, … not taken.
pub fn unique_restore_path(original: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(original) {
        return original.to_string();
    }
    let mut counter = 1;
    loop {
        let next = format!("{}_restored_{}", original, counter);
        if !is_taken(&next) {
            return next;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sanitize_strips_unsafe_characters() {
        assert_eq!(sanitize_path("shop/Item #1!"), "shop/Item-1");
        assert_eq!(sanitize_path("a\\b\\c"), "a/b/c");
        assert_eq!(sanitize_path("/a//b/"), "a/b");
        assert_eq!(sanitize_path("../../etc/passwd"), "etc/passwd");
    }

    #[test]
    fn test_sanitize_empty_becomes_home() {
        assert_eq!(sanitize_path(""), HOME);
        assert_eq!(sanitize_path("   "), HOME);
        assert_eq!(sanitize_path("///"), HOME);
    }

    #[test]
    fn test_sanitize_parent_keeps_empty() {
        assert_eq!(sanitize_parent(""), "");
        assert_eq!(sanitize_parent("/"), "");
        assert_eq!(sanitize_parent("/docs/"), "docs");
        assert_eq!(sanitize_parent("?!"), "");
        assert!(is_blank(" // "));
        assert!(!is_blank("a"));
    }

    #[test]
    fn test_parent_and_leaf() {
        assert_eq!(parent_of("a/b/c"), "a/b");
        assert_eq!(parent_of("a"), "");
        assert_eq!(leaf_of("a/b/c"), "c");
        assert_eq!(leaf_of("a"), "a");
        assert_eq!(depth("a/b/c"), 3);
        assert_eq!(depth(""), 0);
        assert_eq!(join("", "x"), "x");
        assert_eq!(join("a/b", "x"), "a/b/x");
    }

    #[test]
    fn test_prefix_matching_respects_segment_boundaries() {
        assert!(is_same_or_within("a", "a"));
        assert!(is_same_or_within("a/x", "a"));
        assert!(!is_same_or_within("ab", "a"));
        assert!(!is_same_or_within("ab/x", "a"));

        assert_eq!(replace_prefix("a/y/z", "a", "b"), Some("b/y/z".to_string()));
        assert_eq!(replace_prefix("ab", "a", "b"), None);
    }

    #[test]
    fn test_unique_path_suffixes() {
        let taken: HashSet<&str> = ["bar", "bar-2"].into_iter().collect();
        assert_eq!(unique_path("bar", |p| taken.contains(p)), "bar-3");
        assert_eq!(unique_path("baz", |p| taken.contains(p)), "baz");
    }

    #[test]
    fn test_unique_restore_path_suffixes() {
        let taken: HashSet<&str> = ["p", "p_restored_1"].into_iter().collect();
        assert_eq!(unique_restore_path("p", |p| taken.contains(p)), "p_restored_2");
        assert_eq!(unique_restore_path("q", |p| taken.contains(p)), "q");
    }
}
