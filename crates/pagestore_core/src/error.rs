use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Unified error type for page store operations
#[derive(Debug, Error)]
pub enum PageStoreError {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to move '{from}' to '{to}': {source}")]
    FileMove {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error in '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    // Config errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    // Validation errors
    #[error("Page title must not be empty")]
    EmptyTitle,

    #[error("A page already exists at '{0}'")]
    DuplicatePath(String),

    #[error("The home page cannot be {0}")]
    HomeProtected(&'static str),

    #[error("Page '{0}' cannot be its own parent")]
    SelfParent(String),

    #[error("Page not found: '{0}'")]
    PageNotFound(String),

    #[error("Trash entry not found: '{0}'")]
    TrashEntryNotFound(String),

    #[error("Invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    // Structural errors
    #[error("Parent chain starting at '{path}' loops back on itself")]
    CycleDetected { path: String },
}

impl PageStoreError {
    /// Returns true for errors caused by a rejected request rather than a failure.
    ///
    /// Validation errors are raised before any side effect is performed.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PageStoreError::EmptyTitle
                | PageStoreError::DuplicatePath(_)
                | PageStoreError::HomeProtected(_)
                | PageStoreError::SelfParent(_)
                | PageStoreError::PageNotFound(_)
                | PageStoreError::TrashEntryNotFound(_)
                | PageStoreError::InvalidPath { .. }
        )
    }

    /// Returns true for filesystem and serialization failures.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            PageStoreError::Io(_)
                | PageStoreError::FileRead { .. }
                | PageStoreError::FileWrite { .. }
                | PageStoreError::FileMove { .. }
                | PageStoreError::Json { .. }
        )
    }
}

/// Result type alias for page store operations
pub type Result<T> = std::result::Result<T, PageStoreError>;

/// A serializable representation of PageStoreError for IPC
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Associated file or page path (if applicable)
    pub path: Option<String>,
}

impl From<&PageStoreError> for SerializableError {
    fn from(err: &PageStoreError) -> Self {
        let kind = match err {
            PageStoreError::Io(_) => "Io",
            PageStoreError::FileRead { .. } => "FileRead",
            PageStoreError::FileWrite { .. } => "FileWrite",
            PageStoreError::FileMove { .. } => "FileMove",
            PageStoreError::Json { .. } => "Json",
            PageStoreError::ConfigParse(_) => "ConfigParse",
            PageStoreError::ConfigSerialize(_) => "ConfigSerialize",
            PageStoreError::NoConfigDir => "NoConfigDir",
            PageStoreError::EmptyTitle => "EmptyTitle",
            PageStoreError::DuplicatePath(_) => "DuplicatePath",
            PageStoreError::HomeProtected(_) => "HomeProtected",
            PageStoreError::SelfParent(_) => "SelfParent",
            PageStoreError::PageNotFound(_) => "PageNotFound",
            PageStoreError::TrashEntryNotFound(_) => "TrashEntryNotFound",
            PageStoreError::InvalidPath { .. } => "InvalidPath",
            PageStoreError::CycleDetected { .. } => "CycleDetected",
        }
        .to_string();

        let path = match err {
            PageStoreError::FileRead { path, .. }
            | PageStoreError::FileWrite { path, .. }
            | PageStoreError::Json { path, .. } => Some(path.to_string_lossy().into_owned()),
            PageStoreError::FileMove { from, .. } => Some(from.to_string_lossy().into_owned()),
            PageStoreError::DuplicatePath(path)
            | PageStoreError::SelfParent(path)
            | PageStoreError::PageNotFound(path)
            | PageStoreError::TrashEntryNotFound(path)
            | PageStoreError::InvalidPath { path, .. }
            | PageStoreError::CycleDetected { path } => Some(path.clone()),
            _ => None,
        };

        Self {
            kind,
            message: err.to_string(),
            path,
        }
    }
}

impl From<PageStoreError> for SerializableError {
    fn from(err: PageStoreError) -> Self {
        SerializableError::from(&err)
    }
}

impl PageStoreError {
    /// Convert to a serializable representation for IPC
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(PageStoreError::EmptyTitle.is_validation());
        assert!(PageStoreError::DuplicatePath("a".into()).is_validation());
        assert!(!PageStoreError::CycleDetected { path: "a".into() }.is_validation());
        assert!(PageStoreError::Io(std::io::Error::other("boom")).is_io());
    }

    #[test]
    fn test_serializable_error_carries_path() {
        let err = PageStoreError::CycleDetected {
            path: "a/b".to_string(),
        };
        let ser = err.to_serializable();
        assert_eq!(ser.kind, "CycleDetected");
        assert_eq!(ser.path.as_deref(), Some("a/b"));
        assert!(ser.message.contains("a/b"));
    }
}
