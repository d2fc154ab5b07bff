//! In-memory key-value backend.
//!
//! Clones share the same underlying map, so a test can hand one clone to a
//! [`PresetStore`](crate::application::preset_store::PresetStore) and keep
//! another to seed values, inspect what was written, or flip the failure
//! switches:
//!
//! - `set_unavailable(true)` makes every call fail as if the backend could
//!   not be opened.
//! - `set_reject_writes(true)` makes `put` fail while reads keep working.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::application::preset_store::{KeyValueBackend, StorageError};

#[derive(Debug, Default)]
struct MemoryState {
    values: HashMap<String, String>,
    unavailable: bool,
    reject_writes: bool,
    writes: usize,
}

/// A shared in-memory map implementing [`KeyValueBackend`].
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value directly, bypassing the failure switches and the write
    /// counter.
    pub fn insert(&self, key: &str, value: &str) {
        self.lock().values.insert(key.to_string(), value.to_string());
    }

    /// Returns the value under `key`, bypassing the failure switches.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.lock().reject_writes = reject;
    }

    /// Number of successful `put` calls.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // The state stays consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let state = self.lock();
        if state.unavailable {
            return Err(StorageError::Unavailable("memory backend switched off".into()));
        }
        Ok(state.values.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(StorageError::Unavailable("memory backend switched off".into()));
        }
        if state.reject_writes {
            return Err(StorageError::WriteRejected(key.to_string()));
        }
        state.values.insert(key.to_string(), value.to_string());
        state.writes += 1;
        Ok(())
    }
}
