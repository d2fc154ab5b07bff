//! File-backed preferences: one JSON file per namespace.
//!
//! A namespace is a flat string → string map stored at
//! `<dir>/<namespace>.json`:
//!
//! ```json
//! { "presets": "{\"work\":{\"user\":\"alice\",\"pass\":\"s3cret\"}}" }
//! ```
//!
//! The value under `presets` is itself JSON text; the backend does not look
//! inside it.  Each call reads the file from disk.  Writes go to a sibling
//! temporary file that is then renamed over the original, so a failed write
//! never leaves a half-written namespace behind.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::application::preset_store::{KeyValueBackend, StorageError};

/// Preferences namespace persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
    namespace: String,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            namespace: namespace.into(),
        }
    }

    /// Full path of the namespace file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.namespace))
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let path = self.path();
        match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content)
                .map_err(|source| StorageError::Corrupt { path, source }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path();
        let tmp = temp_path(&path);
        let content = serde_json::to_string_pretty(map).map_err(|source| {
            StorageError::Corrupt {
                path: path.clone(),
                source,
            }
        })?;

        std::fs::write(&tmp, content).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        debug!("wrote preferences namespace {}", path.display());
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.remove(key))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
