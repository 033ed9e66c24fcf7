//! JSON persistence primitives.

use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::FileSystem;
use crate::error::{PageStoreError, Result};

/// Read and deserialize a JSON file, returning `default` when the file does not exist.
///
/// A file that exists but cannot be parsed is an error: callers must never
/// overwrite data they failed to understand.
pub fn read_json<T, FS>(fs: &FS, path: &Path, default: T) -> Result<T>
where
    T: DeserializeOwned,
    FS: FileSystem + ?Sized,
{
    let content = match fs.read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(default),
        Err(e) => {
            return Err(PageStoreError::FileRead {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    if content.trim().is_empty() {
        return Ok(default);
    }

    serde_json::from_str(&content).map_err(|e| PageStoreError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Serialize `value` as pretty-printed JSON and atomically replace `path`.
pub fn write_json_atomic<T, FS>(fs: &FS, path: &Path, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    FS: FileSystem + ?Sized,
{
    let mut body = serde_json::to_string_pretty(value).map_err(|e| PageStoreError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    body.push('\n');

    log::debug!("Persisting {}", path.display());
    fs.write_file_atomic(path, &body)
        .map_err(|e| PageStoreError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })
}
