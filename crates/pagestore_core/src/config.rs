//! Configuration types for the page store.
//!
//! This module provides the [`StoreConfig`] struct which locates the page
//! list, trash list, content and image directories. Configuration is
//! persisted as TOML (typically at `~/.config/pagestore/config.toml` on Unix
//! systems).
//!
//! Relative locations resolve against `data_dir`.
//!
//! # Example
//!
//! ```
//! use pagestore_core::config::StoreConfig;
//! use std::path::PathBuf;
//!
//! let config = StoreConfig::new(PathBuf::from("/srv/site/data"));
//! assert_eq!(config.pages_path(), PathBuf::from("/srv/site/data/pages.json"));
//! assert_eq!(config.content_root(), PathBuf::from("/srv/site/data/content"));
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PageStoreError, Result};
use crate::fs::FileSystem;

fn default_pages_file() -> String {
    "pages.json".to_string()
}

fn default_trash_file() -> String {
    "trash.json".to_string()
}

fn default_content_dir() -> String {
    "content".to_string()
}

fn default_trash_dir() -> String {
    "trash".to_string()
}

fn default_images_dir() -> String {
    "uploads/images".to_string()
}

fn default_images_url_prefix() -> String {
    "/uploads/images".to_string()
}

fn default_true() -> bool {
    true
}

/// `StoreConfig` describes where a page store keeps its files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory every relative location below resolves against
    pub data_dir: PathBuf,

    /// Page list, relative to `data_dir`
    #[serde(default = "default_pages_file")]
    pub pages_file: String,

    /// Trash list, relative to `data_dir`
    #[serde(default = "default_trash_file")]
    pub trash_file: String,

    /// Directory of page content files
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// Directory of trashed content files
    #[serde(default = "default_trash_dir")]
    pub trash_dir: String,

    /// Directory holding uploaded images
    #[serde(default = "default_images_dir")]
    pub images_dir: String,

    /// URL prefix under which `images_dir` is served (before `base_path`)
    #[serde(default = "default_images_url_prefix")]
    pub images_url_prefix: String,

    /// Path the site is mounted under, e.g. `/site`. Empty for the domain root.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_path: String,

    /// Delete unreferenced images after a rename
    #[serde(default = "default_true")]
    pub gc_images: bool,
}

impl StoreConfig {
    /// Create a config with default file names under `data_dir`
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            pages_file: default_pages_file(),
            trash_file: default_trash_file(),
            content_dir: default_content_dir(),
            trash_dir: default_trash_dir(),
            images_dir: default_images_dir(),
            images_url_prefix: default_images_url_prefix(),
            base_path: String::new(),
            gc_images: true,
        }
    }

    fn resolve(&self, location: &str) -> PathBuf {
        let location = Path::new(location);
        if location.is_absolute() {
            location.to_path_buf()
        } else {
            self.data_dir.join(location)
        }
    }

    /// Location of `pages.json`
    pub fn pages_path(&self) -> PathBuf {
        self.resolve(&self.pages_file)
    }

    /// Location of `trash.json`
    pub fn trash_path(&self) -> PathBuf {
        self.resolve(&self.trash_file)
    }

    /// Root directory of content files
    pub fn content_root(&self) -> PathBuf {
        self.resolve(&self.content_dir)
    }

    /// Root directory of trashed content files
    pub fn trash_root(&self) -> PathBuf {
        self.resolve(&self.trash_dir)
    }

    /// Root directory of uploaded images
    pub fn images_root(&self) -> PathBuf {
        self.resolve(&self.images_dir)
    }

    /// Load config from a specific path.
    pub fn load_from_sync<FS: FileSystem>(fs: FS, path: &Path) -> Result<Self> {
        let contents = fs
            .read_to_string(path)
            .map_err(|e| PageStoreError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;

        let config: StoreConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to_sync<FS: FileSystem>(&self, fs: FS, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs.write_file_atomic(path, &contents)
            .map_err(|e| PageStoreError::FileWrite {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(())
    }

    /// Load config, returning a default rooted at `data_dir` if it is missing or unreadable.
    pub fn load_from_or_default_sync<FS: FileSystem>(
        fs: FS,
        path: &Path,
        data_dir: PathBuf,
    ) -> Self {
        match Self::load_from_sync(fs, path) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Using default config ({})", e);
                Self::new(data_dir)
            }
        }
    }
}

// ============================================================================
// Native-only implementation (not available in WASM)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
impl Default for StoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pagestore");
        Self::new(data_dir)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl StoreConfig {
    /// Get the config file path (~/.config/pagestore/config.toml)
    /// Only available on native platforms
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pagestore").join("config.toml"))
    }

    /// Load config from default location, or return default if file doesn't exist
    /// Only available on native platforms
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            return Self::load_from_sync(crate::fs::RealFileSystem, &path);
        }

        Ok(StoreConfig::default())
    }

    /// Save config to default location
    /// Only available on native platforms
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(PageStoreError::NoConfigDir)?;
        self.save_to_sync(crate::fs::RealFileSystem, &path)
    }
}

// ============================================================================
// WASM-specific implementation
// ============================================================================

#[cfg(target_arch = "wasm32")]
impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("/data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;

    #[test]
    fn test_minimal_toml_fills_defaults() {
        let fs = InMemoryFileSystem::new();
        fs.write_file(Path::new("config.toml"), "data_dir = \"site\"\nbase_path = \"/shop\"\n")
            .unwrap();

        let config = StoreConfig::load_from_sync(&fs, Path::new("config.toml")).unwrap();
        assert_eq!(config.pages_path(), PathBuf::from("site/pages.json"));
        assert_eq!(config.trash_root(), PathBuf::from("site/trash"));
        assert_eq!(config.images_url_prefix, "/uploads/images");
        assert_eq!(config.base_path, "/shop");
        assert!(config.gc_images);
    }

    #[test]
    fn test_save_and_reload() {
        let fs = InMemoryFileSystem::new();
        let mut config = StoreConfig::new(PathBuf::from("data"));
        config.content_dir = "html".to_string();
        config.gc_images = false;

        config
            .save_to_sync(&fs, Path::new("cfg/config.toml"))
            .unwrap();
        let loaded = StoreConfig::load_from_sync(&fs, Path::new("cfg/config.toml")).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.content_root(), PathBuf::from("data/html"));
    }

    #[test]
    fn test_missing_config_falls_back() {
        let fs = InMemoryFileSystem::new();
        let config = StoreConfig::load_from_or_default_sync(
            &fs,
            Path::new("nope.toml"),
            PathBuf::from("fallback"),
        );
        assert_eq!(config, StoreConfig::new(PathBuf::from("fallback")));
    }
}
