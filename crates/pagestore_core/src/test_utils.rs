//! Test utilities for pagestore_core
//!
//! This module provides shared testing infrastructure: a filesystem that
//! fails on demand, and helpers to seed a store.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::StoreConfig;
use crate::fs::{FileSystem, InMemoryFileSystem};
use crate::page::Page;
use crate::repository::PageRepository;
use crate::store::PageStore;

/// An in-memory filesystem that fails selected operations.
///
/// Clones share both the files and the failure rules.
#[derive(Clone, Default)]
pub struct FailingFileSystem {
    inner: InMemoryFileSystem,
    failing_move_targets: Arc<Mutex<HashSet<PathBuf>>>,
    failing_writes: Arc<Mutex<HashSet<PathBuf>>>,
}

impl FailingFileSystem {
    /// Create a new empty filesystem with no failure rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every move whose destination is `path` fail.
    pub fn fail_moves_to(&self, path: &str) {
        self.failing_move_targets
            .lock()
            .unwrap()
            .insert(PathBuf::from(path));
    }

    /// Make every write (plain or atomic) to `path` fail.
    pub fn fail_writes_to(&self, path: &str) {
        self.failing_writes
            .lock()
            .unwrap()
            .insert(PathBuf::from(path));
    }

    /// Get the content of a file (for test assertions).
    pub fn get_content(&self, path: &str) -> Option<String> {
        self.inner.read_to_string(Path::new(path)).ok()
    }

    fn check_write(&self, path: &Path) -> io::Result<()> {
        if self.failing_writes.lock().unwrap().contains(path) {
            return Err(io::Error::other(format!("injected write failure: {:?}", path)));
        }
        Ok(())
    }
}

impl FileSystem for FailingFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.inner.read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> io::Result<()> {
        self.check_write(path)?;
        self.inner.write_file(path, content)
    }

    fn write_file_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        self.check_write(path)?;
        self.inner.write_file_atomic(path, content)
    }

    fn create_new(&self, path: &Path, content: &str) -> io::Result<()> {
        self.check_write(path)?;
        self.inner.create_new(path, content)
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        self.inner.delete_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.inner.create_dir_all(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.failing_move_targets.lock().unwrap().contains(to) {
            return Err(io::Error::other(format!("injected move failure: {:?}", to)));
        }
        self.inner.move_file(from, to)
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        self.inner.list_files(dir)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        self.inner.remove_dir(path)
    }
}

/// Write `pages` (plus `home`) as the page list of a store rooted at `data`.
pub fn seed_pages<FS: FileSystem>(fs: FS, pages: &[(&str, &str)]) {
    let mut records = vec![Page::home()];
    records.extend(pages.iter().map(|(path, title)| Page::new(*path, *title)));
    PageRepository::new(fs, "data/pages.json")
        .persist(&records)
        .unwrap();
}

/// An in-memory store rooted at `data` holding `home` and `pages`.
///
/// The returned filesystem shares storage with the store.
pub fn store_with(pages: &[(&str, &str)]) -> (InMemoryFileSystem, PageStore<InMemoryFileSystem>) {
    let fs = InMemoryFileSystem::new();
    seed_pages(&fs, pages);
    let store = PageStore::new(fs.clone(), StoreConfig::new(PathBuf::from("data")));
    (fs, store)
}
