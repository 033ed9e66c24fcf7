//! In-memory filesystem implementation.
//!
//! Available on all targets, including WASM. Also the backend for unit tests.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Error, ErrorKind, Result};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};

use super::FileSystem;

#[derive(Default)]
struct Entries {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
}

impl Entries {
    /// Register every ancestor of `path` (excluding the empty root) as a directory
    fn add_ancestors(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }

    fn is_occupied(&self, dir: &Path) -> bool {
        self.files.keys().any(|f| f.starts_with(dir))
            || self.dirs.iter().any(|d| d != dir && d.starts_with(dir))
    }
}

/// Filesystem kept entirely in memory.
///
/// Clones share the same storage, so a test can hand one clone to a store
/// and inspect the files through another.
#[derive(Clone, Default)]
pub struct InMemoryFileSystem {
    entries: Arc<RwLock<Entries>>,
}

impl InMemoryFileSystem {
    /// Create a new empty in-memory filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filesystem holding `files` (path, content)
    pub fn with_files(files: Vec<(PathBuf, String)>) -> Self {
        let fs = Self::new();
        {
            let mut entries = fs.entries.write().unwrap();
            for (path, content) in files {
                let path = normalize(&path);
                entries.add_ancestors(&path);
                entries.files.insert(path, content);
            }
        }
        fs
    }

    /// All file paths, sorted
    pub fn list_all_files(&self) -> Vec<PathBuf> {
        self.entries.read().unwrap().files.keys().cloned().collect()
    }
}

/// Resolve `.` and `..` lexically
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn not_found(what: &str, path: &Path) -> Error {
    Error::new(ErrorKind::NotFound, format!("{} not found: {:?}", what, path))
}

impl FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.entries
            .read()
            .unwrap()
            .files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| not_found("File", path))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let path = normalize(path);
        let mut entries = self.entries.write().unwrap();
        entries.add_ancestors(&path);
        entries.files.insert(path, content.to_string());
        Ok(())
    }

    fn create_new(&self, path: &Path, content: &str) -> Result<()> {
        let normalized = normalize(path);
        let mut entries = self.entries.write().unwrap();
        if entries.files.contains_key(&normalized) {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("File already exists: {:?}", path),
            ));
        }
        entries.add_ancestors(&normalized);
        entries.files.insert(normalized, content.to_string());
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        self.entries
            .write()
            .unwrap()
            .files
            .remove(&normalize(path))
            .map(|_| ())
            .ok_or_else(|| not_found("File", path))
    }

    fn exists(&self, path: &Path) -> bool {
        let path = normalize(path);
        let entries = self.entries.read().unwrap();
        entries.files.contains_key(&path) || entries.dirs.contains(&path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let path = normalize(path);
        let mut entries = self.entries.write().unwrap();
        entries.add_ancestors(&path);
        if !path.as_os_str().is_empty() {
            entries.dirs.insert(path);
        }
        Ok(())
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.entries.read().unwrap().dirs.contains(&normalize(path))
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
        let source = normalize(from);
        let target = normalize(to);
        if source == target {
            return Ok(());
        }

        let mut entries = self.entries.write().unwrap();
        if entries.files.contains_key(&target) {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("Destination already exists: {:?}", to),
            ));
        }
        let content = entries
            .files
            .remove(&source)
            .ok_or_else(|| not_found("Source file", from))?;
        entries.add_ancestors(&target);
        entries.files.insert(target, content);
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let dir = normalize(dir);
        let entries = self.entries.read().unwrap();
        let mut children: Vec<PathBuf> = entries
            .files
            .keys()
            .chain(entries.dirs.iter())
            .filter(|p| p.parent() == Some(dir.as_path()))
            .cloned()
            .collect();
        children.sort();
        Ok(children)
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        let dir = normalize(path);
        let mut entries = self.entries.write().unwrap();
        if !entries.dirs.contains(&dir) {
            return Err(not_found("Directory", path));
        }
        if entries.is_occupied(&dir) {
            return Err(Error::new(
                ErrorKind::DirectoryNotEmpty,
                format!("Directory not empty: {:?}", path),
            ));
        }
        entries.dirs.remove(&dir);
        Ok(())
    }
}
