//! Cleanup of uploaded images no page refers to any more.
//!
//! Collection is best-effort: every failure is logged and skipped, and
//! [`ImageCollector::collect_garbage`] never returns an error.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::fs::FileSystem;

/// `<img … src="…">` or `<img … src='…'>`
static IMG_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// File extensions treated as images
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "avif", "bmp", "ico",
];

/// What a collection pass removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcReport {
    /// Image files deleted
    pub removed_files: Vec<PathBuf>,
    /// Empty directories deleted, deepest first
    pub removed_dirs: Vec<PathBuf>,
}

impl GcReport {
    /// Returns true if nothing was removed
    pub fn is_empty(&self) -> bool {
        self.removed_files.is_empty() && self.removed_dirs.is_empty()
    }
}

/// Deletes images under the images directory that no page references.
pub struct ImageCollector<FS: FileSystem> {
    fs: FS,
    root: PathBuf,
    url_prefix: String,
}

impl<FS: FileSystem> ImageCollector<FS> {
    /// Create a collector for images stored in `root` and served under
    /// `base_path` + `url_prefix`.
    pub fn new(fs: FS, root: impl Into<PathBuf>, base_path: &str, url_prefix: &str) -> Self {
        let base = base_path.trim().trim_matches('/');
        let prefix = url_prefix.trim().trim_matches('/');
        let url_prefix = if base.is_empty() {
            format!("/{}/", prefix)
        } else {
            format!("/{}/{}/", base, prefix)
        };
        Self {
            fs,
            root: root.into(),
            url_prefix,
        }
    }

    /// Image files referenced by `html`, relative to the images root
    pub fn referenced_images(&self, html: &str) -> HashSet<String> {
        IMG_SRC_RE
            .captures_iter(html)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .filter_map(|m| self.relative_image(m.as_str()))
            .collect()
    }

    fn relative_image(&self, src: &str) -> Option<String> {
        // Drop scheme and host of absolute URLs
        let path = match src.find("://") {
            Some(i) => {
                let after = &src[i + 3..];
                &after[after.find('/')?..]
            }
            None => src,
        };
        let end = path.find(['?', '#']).unwrap_or(path.len());
        let relative = path[..end].strip_prefix(&self.url_prefix)?;
        (!relative.is_empty()).then(|| relative.to_string())
    }

    /// Delete every image not referenced by any of `html_sources`, then
    /// remove directories left empty.
    ///
    /// The traversal is iterative over an owned list of directories; the
    /// images root itself is never removed.
    pub fn collect_garbage<S: AsRef<str>>(&self, html_sources: &[S]) -> GcReport {
        let mut report = GcReport::default();
        if !self.fs.is_dir(&self.root) {
            return report;
        }

        let referenced: HashSet<String> = html_sources
            .iter()
            .flat_map(|html| self.referenced_images(html.as_ref()))
            .collect();

        let mut dirs: Vec<PathBuf> = vec![self.root.clone()];
        let mut images: Vec<PathBuf> = Vec::new();
        let mut cursor = 0;
        while cursor < dirs.len() {
            let entries = match self.fs.list_files(&dirs[cursor]) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("Image cleanup could not list {}: {}", dirs[cursor].display(), e);
                    Vec::new()
                }
            };
            cursor += 1;

            for entry in entries {
                if self.fs.is_dir(&entry) {
                    dirs.push(entry);
                } else if is_image(&entry) {
                    images.push(entry);
                }
            }
        }

        for image in images {
            let Some(relative) = self.relative_key(&image) else {
                continue;
            };
            if referenced.contains(&relative) {
                continue;
            }
            match self.fs.delete_file(&image) {
                Ok(()) => {
                    log::debug!("Removed unreferenced image {}", image.display());
                    report.removed_files.push(image);
                }
                Err(e) => log::warn!("Failed to remove image {}: {}", image.display(), e),
            }
        }

        let mut subdirs: Vec<PathBuf> = dirs.into_iter().skip(1).collect();
        subdirs.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));
        for dir in subdirs {
            let is_empty = self
                .fs
                .list_files(&dir)
                .map(|entries| entries.is_empty())
                .unwrap_or(false);
            if !is_empty {
                continue;
            }
            match self.fs.remove_dir(&dir) {
                Ok(()) => report.removed_dirs.push(dir),
                Err(e) => log::warn!("Failed to remove directory {}: {}", dir.display(), e),
            }
        }

        report
    }

    /// `/`-joined path of `file` below the images root
    fn relative_key(&self, file: &Path) -> Option<String> {
        let relative = file.strip_prefix(&self.root).ok()?;
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(segments.join("/"))
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;

    fn fs_with_images() -> InMemoryFileSystem {
        InMemoryFileSystem::with_files(vec![
            (PathBuf::from("img/keep.png"), String::new()),
            (PathBuf::from("img/drop.jpg"), String::new()),
            (PathBuf::from("img/2024/old.gif"), String::new()),
            (PathBuf::from("img/2025/used.webp"), String::new()),
            (PathBuf::from("img/notes.txt"), String::new()),
        ])
    }

    #[test]
    fn test_referenced_images() {
        let collector = ImageCollector::new(InMemoryFileSystem::new(), "img", "", "/uploads/images");
        let html = r#"<p><img alt="a" src="/uploads/images/a.png?v=2"></p>
            <img src='https://example.com/uploads/images/b/c.jpg'>
            <img src="/elsewhere/d.png">"#;
        let mut found: Vec<String> = collector.referenced_images(html).into_iter().collect();
        found.sort();
        assert_eq!(found, vec!["a.png", "b/c.jpg"]);
    }

    #[test]
    fn test_base_path_prefix() {
        let collector =
            ImageCollector::new(InMemoryFileSystem::new(), "img", "/site", "uploads/images/");
        let found = collector.referenced_images(r#"<img src="/site/uploads/images/a.png">"#);
        assert!(found.contains("a.png"));
        assert!(
            collector
                .referenced_images(r#"<img src="/uploads/images/a.png">"#)
                .is_empty()
        );
    }

    #[test]
    fn test_collect_removes_unreferenced_and_empty_dirs() {
        let fs = fs_with_images();
        let collector = ImageCollector::new(&fs, "img", "", "/uploads/images");
        let pages = vec![
            r#"<img src="/uploads/images/keep.png">"#.to_string(),
            r#"<img src="/uploads/images/2025/used.webp">"#.to_string(),
        ];

        let report = collector.collect_garbage(&pages);

        assert!(fs.exists(Path::new("img/keep.png")));
        assert!(fs.exists(Path::new("img/2025/used.webp")));
        assert!(fs.exists(Path::new("img/notes.txt")));
        assert!(!fs.exists(Path::new("img/drop.jpg")));
        assert!(!fs.exists(Path::new("img/2024/old.gif")));
        assert_eq!(report.removed_files.len(), 2);
        assert_eq!(report.removed_dirs, vec![PathBuf::from("img/2024")]);
        assert!(fs.is_dir(Path::new("img")));
    }

    #[test]
    fn test_missing_root_is_noop() {
        let fs = InMemoryFileSystem::new();
        let collector = ImageCollector::new(&fs, "img", "", "/uploads/images");
        assert!(collector.collect_garbage::<&str>(&[]).is_empty());
    }
}
