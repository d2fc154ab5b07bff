//! PresetStore: validated CRUD over the single persisted preset document.
//!
//! The store reads the whole document from a [`KeyValueBackend`] on every
//! operation and rewrites it in full on every mutation.  There is no cached
//! copy between operations, so a failed write leaves whatever the backend
//! held before untouched.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use webkbd_core::domain::preset::{
    count_top_level_keys, validate_preset, DocumentError, PresetDocument, ValidationError,
};

/// Reserved backend key holding the serialized preset document.
pub const PRESETS_KEY: &str = "presets";

/// Text stored for, and substituted for, an empty document.
pub const EMPTY_DOCUMENT: &str = "{}";

/// Default cap on the serialized document size, in bytes.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 8192;

/// Error type for key-value backend operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be opened.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// A file system I/O error occurred.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backend's own container could not be decoded.
    #[error("preferences file {path} is corrupt: {source}")]
    Corrupt {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The backend refused the write.
    #[error("backend rejected write of key '{0}'")]
    WriteRejected(String),
}

/// Durable key → string storage (flash preferences on the device, a file on
/// a host).
///
/// Implementations open, use and close their underlying resource inside each
/// call; nothing is held between calls.
pub trait KeyValueBackend: Send + Sync {
    /// Returns the value stored under `key`, or `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Returns `true` if `key` is present.
    fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key)?.is_some())
    }
}

impl<T: KeyValueBackend + ?Sized> KeyValueBackend for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).put(key, value)
    }

    fn contains(&self, key: &str) -> Result<bool, StorageError> {
        (**self).contains(key)
    }
}

/// Failure of a preset mutation.
///
/// The variants are kept distinct so callers can tell a bad name from a bad
/// password from a storage failure, even where the HTTP layer reports them
/// with the same status.
#[derive(Debug, Error)]
pub enum PresetError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Parse(#[from] DocumentError),

    #[error("preset '{0}' not found")]
    NotFound(String),

    #[error("serialized document is {size} bytes, limit is {limit}")]
    DocumentTooLarge { size: usize, limit: usize },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Owns the preset document for the lifetime of the process.
pub struct PresetStore<B> {
    backend: B,
    max_document_bytes: usize,
}

impl<B: KeyValueBackend> PresetStore<B> {
    /// Opens the store with the default document size limit.
    pub fn open(backend: B) -> Self {
        Self::with_document_limit(backend, DEFAULT_MAX_DOCUMENT_BYTES)
    }

    /// Opens the store, writing an empty document under [`PRESETS_KEY`] if
    /// the key is absent.
    ///
    /// Initialization failures are logged and otherwise ignored: reads fall
    /// back to the empty document and writes report their own errors.
    pub fn with_document_limit(backend: B, max_document_bytes: usize) -> Self {
        match backend.contains(PRESETS_KEY) {
            Ok(true) => {}
            Ok(false) => match backend.put(PRESETS_KEY, EMPTY_DOCUMENT) {
                Ok(()) => info!("initialized empty preset document"),
                Err(e) => warn!("failed to initialize preset document: {e}"),
            },
            Err(e) => warn!("preset storage not available at startup: {e}"),
        }

        Self {
            backend,
            max_document_bytes,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn max_document_bytes(&self) -> usize {
        self.max_document_bytes
    }

    /// Returns the stored document text exactly as persisted.
    ///
    /// Falls back to `{}` when the key is absent, the stored text is empty,
    /// or the backend cannot be read.  Malformed text is returned as-is.
    pub fn load_raw(&self) -> String {
        match self.backend.get(PRESETS_KEY) {
            Ok(Some(text)) if !text.is_empty() => text,
            Ok(_) => EMPTY_DOCUMENT.to_string(),
            Err(e) => {
                warn!("reading preset document failed, using empty document: {e}");
                EMPTY_DOCUMENT.to_string()
            }
        }
    }

    /// Returns the parsed document, or an empty one if the stored text does
    /// not parse.
    pub fn load(&self) -> PresetDocument {
        PresetDocument::parse(&self.load_raw()).unwrap_or_default()
    }

    /// Number of top-level keys in the stored document; 0 if it is not a
    /// JSON object.
    pub fn count(&self) -> usize {
        count_top_level_keys(&self.load_raw()).unwrap_or(0)
    }

    /// Creates or overwrites preset `name`.
    ///
    /// # Errors
    ///
    /// - [`PresetError::Validation`] if a field is out of bounds (no storage
    ///   access happens in that case).
    /// - [`PresetError::Parse`] if the stored document is not a mapping.
    /// - [`PresetError::DocumentTooLarge`] if the result would exceed the
    ///   size limit.
    /// - [`PresetError::Storage`] if the backend rejects the write.
    pub fn set(&self, name: &str, user: &str, pass: &str) -> Result<(), PresetError> {
        validate_preset(name, user, pass)?;

        let mut doc = self.load_for_update()?;
        if let Some(previous) = doc.upsert(name, user, pass) {
            if previous.is_legacy() {
                info!(preset = name, "upgraded legacy preset to structured form");
            }
        }

        self.save(&doc)?;
        debug!(preset = name, total = doc.len(), "preset saved");
        Ok(())
    }

    /// Deletes preset `name`.
    ///
    /// # Errors
    ///
    /// - [`PresetError::Parse`] if the stored document is not a mapping.
    /// - [`PresetError::NotFound`] if `name` is absent.
    /// - [`PresetError::Storage`] if the backend rejects the write.
    pub fn remove(&self, name: &str) -> Result<(), PresetError> {
        let mut doc = self.load_for_update()?;
        if doc.remove(name).is_none() {
            return Err(PresetError::NotFound(name.to_string()));
        }

        self.save(&doc)?;
        debug!(preset = name, total = doc.len(), "preset removed");
        Ok(())
    }

    fn load_for_update(&self) -> Result<PresetDocument, PresetError> {
        Ok(PresetDocument::parse(&self.load_raw())?)
    }

    fn save(&self, doc: &PresetDocument) -> Result<(), PresetError> {
        let text = doc.to_json()?;
        if text.len() > self.max_document_bytes {
            return Err(PresetError::DocumentTooLarge {
                size: text.len(),
                limit: self.max_document_bytes,
            });
        }
        self.backend.put(PRESETS_KEY, &text)?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::memory::MemoryBackend;
    use webkbd_core::domain::preset::{Preset, PresetEntry};

    fn fresh_store() -> (PresetStore<MemoryBackend>, MemoryBackend) {
        let backend = MemoryBackend::new();
        let store = PresetStore::open(backend.clone());
        (store, backend)
    }

    fn seeded_store(text: &str) -> (PresetStore<MemoryBackend>, MemoryBackend) {
        let backend = MemoryBackend::new();
        backend.insert(PRESETS_KEY, text);
        let store = PresetStore::open(backend.clone());
        (store, backend)
    }

    // ── open / load ───────────────────────────────────────────────────────────

    #[test]
    fn test_open_initializes_absent_key_with_empty_document() {
        let (_store, backend) = fresh_store();
        assert_eq!(backend.raw(PRESETS_KEY).as_deref(), Some("{}"));
    }

    #[test]
    fn test_open_leaves_existing_document_alone() {
        let (_store, backend) = seeded_store(r#"{"a":"x"}"#);
        assert_eq!(backend.raw(PRESETS_KEY).as_deref(), Some(r#"{"a":"x"}"#));
        assert_eq!(backend.write_count(), 0);
    }

    #[test]
    fn test_load_raw_substitutes_empty_document_for_empty_text() {
        let (store, _backend) = seeded_store("");
        assert_eq!(store.load_raw(), "{}");
    }

    #[test]
    fn test_load_raw_returns_malformed_text_verbatim() {
        let (store, _backend) = seeded_store("{not json");
        assert_eq!(store.load_raw(), "{not json");
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_raw_falls_back_when_backend_unavailable() {
        let (store, backend) = seeded_store(r#"{"a":"x"}"#);
        backend.set_unavailable(true);
        assert_eq!(store.load_raw(), "{}");
        assert_eq!(store.count(), 0);
    }

    // ── count ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_count_on_fresh_backend_is_zero() {
        let (store, _backend) = fresh_store();
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_count_after_distinct_sets() {
        let (store, _backend) = fresh_store();
        for i in 0..5 {
            store.set(&format!("preset-{i}"), "u", "p").unwrap();
        }
        assert_eq!(store.count(), 5);
    }

    #[test]
    fn test_count_of_unparseable_document_is_zero() {
        let (store, _backend) = seeded_store("[1,2,3]");
        assert_eq!(store.count(), 0);
    }

    // ── set ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_set_then_load_returns_exact_fields() {
        let (store, _backend) = fresh_store();

        store.set("work", "alice", "s3cret").unwrap();

        assert_eq!(
            store.load().get("work"),
            Some(&PresetEntry::Structured(Preset::new("alice", "s3cret")))
        );
    }

    #[test]
    fn test_set_with_invalid_name_does_not_touch_storage() {
        let (store, backend) = fresh_store();
        store.set("keep", "u", "p").unwrap();
        let before = store.load_raw();
        let writes = backend.write_count();

        for name in [String::new(), "n".repeat(65)] {
            let err = store.set(&name, "u", "p").unwrap_err();
            assert!(matches!(err, PresetError::Validation(_)), "got {err:?}");
        }

        assert_eq!(store.load_raw(), before);
        assert_eq!(backend.write_count(), writes);
    }

    #[test]
    fn test_set_validation_runs_before_backend_availability() {
        let (store, backend) = fresh_store();
        backend.set_unavailable(true);

        let err = store.set("", "u", "p").unwrap_err();

        assert!(matches!(err, PresetError::Validation(ValidationError::EmptyName)));
    }

    #[test]
    fn test_set_reports_specific_field_errors() {
        let (store, _backend) = fresh_store();
        let long = "x".repeat(129);
        assert!(matches!(
            store.set("a", &long, ""),
            Err(PresetError::Validation(ValidationError::UserTooLong { .. }))
        ));
        assert!(matches!(
            store.set("a", "", &long),
            Err(PresetError::Validation(ValidationError::PassTooLong { .. }))
        ));
    }

    #[test]
    fn test_set_is_idempotent() {
        let (store, _backend) = fresh_store();
        store.set("a", "u", "p").unwrap();
        let once = store.load_raw();
        store.set("a", "u", "p").unwrap();
        assert_eq!(store.load_raw(), once);
    }

    #[test]
    fn test_set_upgrades_legacy_entry() {
        let (store, _backend) = seeded_store(r#"{"n":"legacyPass"}"#);

        store.set("n", "u2", "p2").unwrap();

        assert_eq!(store.load_raw(), r#"{"n":{"user":"u2","pass":"p2"}}"#);
    }

    #[test]
    fn test_set_keeps_other_legacy_entries_untouched() {
        let (store, _backend) = seeded_store(r#"{"old":"pw"}"#);

        store.set("new", "u", "p").unwrap();

        let doc = store.load();
        assert_eq!(doc.get("old"), Some(&PresetEntry::Legacy("pw".into())));
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_set_succeeds_beside_value_of_unknown_shape() {
        // Arrange
        let (store, backend) = seeded_store(r#"{"a":42}"#);
        assert_eq!(store.count(), 1);

        // Act
        store.set("b", "u", "p").unwrap();

        // Assert
        assert_eq!(
            backend.raw(PRESETS_KEY).as_deref(),
            Some(r#"{"a":42,"b":{"user":"u","pass":"p"}}"#)
        );
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_set_overwrites_value_of_unknown_shape() {
        let (store, _backend) = seeded_store(r#"{"a":[1,2]}"#);
        store.set("a", "u", "p").unwrap();
        assert_eq!(store.load_raw(), r#"{"a":{"user":"u","pass":"p"}}"#);
    }

    #[test]
    fn test_set_keeps_extra_fields_of_untouched_entries() {
        let (store, _backend) = seeded_store(r#"{"a":{"user":"u","pass":"p","note":"keep me"}}"#);

        store.set("b", "x", "y").unwrap();

        assert_eq!(
            store.load_raw(),
            r#"{"a":{"user":"u","pass":"p","note":"keep me"},"b":{"user":"x","pass":"y"}}"#
        );
    }

    #[test]
    fn test_set_fails_with_parse_error_on_corrupt_document() {
        let (store, backend) = seeded_store("{corrupt");
        let err = store.set("a", "u", "p").unwrap_err();
        assert!(matches!(err, PresetError::Parse(_)));
        assert_eq!(backend.raw(PRESETS_KEY).as_deref(), Some("{corrupt"));
    }

    #[test]
    fn test_set_surfaces_rejected_write_as_storage_error() {
        let (store, backend) = fresh_store();
        store.set("a", "u", "p").unwrap();
        backend.set_reject_writes(true);

        let err = store.set("b", "u", "p").unwrap_err();

        assert!(matches!(err, PresetError::Storage(_)));
        assert_eq!(store.count(), 1, "previous document must survive");
    }

    #[test]
    fn test_set_rejects_document_over_size_limit() {
        let backend = MemoryBackend::new();
        let store = PresetStore::with_document_limit(backend.clone(), 64);

        store.set("a", "u", "p").unwrap();
        let err = store.set("b", &"u".repeat(100), "p").unwrap_err();

        assert!(matches!(err, PresetError::DocumentTooLarge { limit: 64, .. }));
        assert_eq!(store.count(), 1);
    }

    // ── remove ────────────────────────────────────────────────────────────────

    #[test]
    fn test_remove_missing_is_not_found() {
        let (store, _backend) = fresh_store();
        assert!(matches!(store.remove("missing"), Err(PresetError::NotFound(n)) if n == "missing"));
    }

    #[test]
    fn test_remove_existing_decrements_count_by_one() {
        let (store, _backend) = fresh_store();
        store.set("a", "u", "p").unwrap();
        store.set("b", "u", "p").unwrap();

        store.remove("a").unwrap();

        assert_eq!(store.count(), 1);
        assert!(!store.load().contains("a"));
    }

    #[test]
    fn test_remove_works_on_legacy_entries() {
        let (store, _backend) = seeded_store(r#"{"old":"pw"}"#);
        store.remove("old").unwrap();
        assert_eq!(store.load_raw(), "{}");
    }

    #[test]
    fn test_remove_deletes_value_of_unknown_shape() {
        let (store, _backend) = seeded_store(r#"{"a":42,"b":null}"#);

        store.remove("a").unwrap();

        assert_eq!(store.load_raw(), r#"{"b":null}"#);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_remove_on_corrupt_document_is_parse_error() {
        let (store, _backend) = seeded_store("nope");
        assert!(matches!(store.remove("a"), Err(PresetError::Parse(_))));
    }

    #[test]
    fn test_remove_surfaces_rejected_write_as_storage_error() {
        let (store, backend) = fresh_store();
        store.set("a", "u", "p").unwrap();
        backend.set_reject_writes(true);

        assert!(matches!(store.remove("a"), Err(PresetError::Storage(_))));
        assert_eq!(store.count(), 1);
    }

    // ── scenario ──────────────────────────────────────────────────────────────

    #[test]
    fn test_crud_scenario_on_empty_backend() {
        let (store, _backend) = fresh_store();

        store.set("work", "alice", "s3cret").unwrap();
        assert_eq!(store.count(), 1);

        assert!(matches!(store.set("", "x", "y"), Err(PresetError::Validation(_))));
        assert_eq!(store.count(), 1);

        store.remove("work").unwrap();
        assert_eq!(store.count(), 0);

        assert!(matches!(store.remove("work"), Err(PresetError::NotFound(_))));
    }
}
