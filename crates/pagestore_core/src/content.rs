//! Page content files.
//!
//! Each page owns one HTML file at `<root>/<path>.html`, with the page path's
//! segments mapped to nested directories. [`MoveLog`] records the moves of a
//! multi-file operation so they can be undone when a later step fails.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{PageStoreError, Result};
use crate::fs::FileSystem;

/// File suffix of content files
pub const CONTENT_EXTENSION: &str = "html";

/// Maps page paths to HTML files below a root directory
pub struct ContentStore<FS: FileSystem> {
    fs: FS,
    root: PathBuf,
}

impl<FS: FileSystem> ContentStore<FS> {
    /// Create a content store rooted at `root`
    pub fn new(fs: FS, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    /// Root directory of this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the content of `path`
    pub fn file_for(&self, path: &str) -> PathBuf {
        let mut file = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            file.push(segment);
        }
        file.set_extension(CONTENT_EXTENSION);
        file
    }

    /// Checks whether `path` has a content file
    pub fn exists(&self, path: &str) -> bool {
        self.fs.exists(&self.file_for(path))
    }

    /// Read the HTML of `path`. A missing file reads as an empty body.
    pub fn read(&self, path: &str) -> Result<String> {
        let file = self.file_for(path);
        match self.fs.read_to_string(&file) {
            Ok(html) => Ok(html),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(PageStoreError::FileRead {
                path: file,
                source: e,
            }),
        }
    }

    /// Atomically replace the HTML of `path`
    pub fn write(&self, path: &str, html: &str) -> Result<()> {
        let file = self.file_for(path);
        self.fs
            .write_file_atomic(&file, html)
            .map_err(|e| PageStoreError::FileWrite {
                path: file,
                source: e,
            })
    }

    /// Delete the content file of `path`; a missing file is not an error.
    pub fn delete(&self, path: &str) -> Result<()> {
        let file = self.file_for(path);
        match self.fs.delete_file(&file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PageStoreError::FileWrite {
                path: file,
                source: e,
            }),
        }
    }
}

/// A completed file move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMove {
    /// Original location
    pub from: PathBuf,
    /// Location after the move
    pub to: PathBuf,
}

/// Log of file moves performed by one operation.
///
/// This is the only undo mechanism available: on failure the log is replayed
/// in reverse, moving every file back where it came from.
#[derive(Debug, Default)]
pub struct MoveLog {
    completed: Vec<FileMove>,
}

impl MoveLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves recorded so far, in execution order
    pub fn moves(&self) -> &[FileMove] {
        &self.completed
    }

    /// Returns true when nothing has been moved
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Move `from` to `to` and record it.
    pub fn move_file<FS: FileSystem>(&mut self, fs: &FS, from: &Path, to: &Path) -> Result<()> {
        log::debug!("Moving {} -> {}", from.display(), to.display());
        fs.move_file(from, to)
            .map_err(|e| PageStoreError::FileMove {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                source: e,
            })?;
        self.completed.push(FileMove {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        Ok(())
    }

    /// Undo every recorded move, newest first.
    ///
    /// Failures are logged and skipped so they never mask the error that
    /// triggered the rollback. Returns the number of moves that could not be undone.
    pub fn rollback<FS: FileSystem>(self, fs: &FS) -> usize {
        let mut failed = 0;
        for entry in self.completed.into_iter().rev() {
            if let Err(e) = fs.move_file(&entry.to, &entry.from) {
                failed += 1;
                log::warn!(
                    "Rollback failed to move {} back to {}: {}",
                    entry.to.display(),
                    entry.from.display(),
                    e
                );
            }
        }
        failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;

    #[test]
    fn test_file_for_maps_segments_to_directories() {
        let store = ContentStore::new(InMemoryFileSystem::new(), "content");
        assert_eq!(
            store.file_for("shop/mugs/blue"),
            PathBuf::from("content/shop/mugs/blue.html")
        );
        assert_eq!(store.file_for("home"), PathBuf::from("content/home.html"));
    }

    #[test]
    fn test_read_missing_is_empty() {
        let store = ContentStore::new(InMemoryFileSystem::new(), "content");
        assert_eq!(store.read("nothing").unwrap(), "");
        assert!(!store.exists("nothing"));
    }

    #[test]
    fn test_write_read_delete() {
        let fs = InMemoryFileSystem::new();
        let store = ContentStore::new(&fs, "content");

        store.write("a/b", "<p>b</p>").unwrap();
        assert!(store.exists("a/b"));
        assert_eq!(store.read("a/b").unwrap(), "<p>b</p>");

        store.delete("a/b").unwrap();
        store.delete("a/b").unwrap();
        assert!(!store.exists("a/b"));
    }

    #[test]
    fn test_move_log_rollback_restores_files() {
        let fs = InMemoryFileSystem::new();
        fs.write_file(Path::new("c/a.html"), "a").unwrap();
        fs.write_file(Path::new("c/a/x.html"), "x").unwrap();

        let mut log = MoveLog::new();
        log.move_file(&fs, Path::new("c/a.html"), Path::new("c/b.html"))
            .unwrap();
        log.move_file(&fs, Path::new("c/a/x.html"), Path::new("c/b/x.html"))
            .unwrap();
        assert_eq!(log.moves().len(), 2);

        let err = log
            .move_file(&fs, Path::new("c/missing.html"), Path::new("c/z.html"))
            .unwrap_err();
        assert!(matches!(err, PageStoreError::FileMove { .. }));
        assert_eq!(log.moves().len(), 2);

        assert_eq!(log.rollback(&fs), 0);
        assert_eq!(fs.read_to_string(Path::new("c/a.html")).unwrap(), "a");
        assert_eq!(fs.read_to_string(Path::new("c/a/x.html")).unwrap(), "x");
        assert!(!fs.exists(Path::new("c/b.html")));
    }
}
