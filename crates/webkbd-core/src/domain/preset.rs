//! Credential presets and the document that stores them.
//!
//! All presets live in a single JSON object keyed by preset name:
//!
//! ```json
//! {
//!   "work":   { "user": "alice", "pass": "s3cret" },
//!   "router": "admin123"
//! }
//! ```
//!
//! The second entry is the *legacy* schema: before usernames were stored, a
//! preset was just its password as a bare string.  Such entries are still
//! read, and are upgraded to the structured form the next time the preset is
//! written.
//!
//! Any other value (a number, an array, an object without string `user` and
//! `pass`) is kept as opaque JSON and written back unchanged.  Only text that
//! is not a JSON object at all fails to parse.
//!
//! # Limits
//!
//! | Field | Length (characters) |
//! |-------|---------------------|
//! | name  | 1 ..= 64            |
//! | user  | 0 ..= 128           |
//! | pass  | 0 ..= 128           |
//!
//! Limits are checked when a preset is written ([`validate_preset`]); stored
//! documents are not re-validated on read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Maximum preset name length, in characters.
pub const MAX_NAME_LEN: usize = 64;
/// Maximum username length, in characters.
pub const MAX_USER_LEN: usize = 128;
/// Maximum password length, in characters.
pub const MAX_PASS_LEN: usize = 128;

/// A field of a preset write failed its bounds check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("bad name: preset name must not be empty")]
    EmptyName,
    #[error("bad name: {len} characters exceeds the limit of {max}")]
    NameTooLong { len: usize, max: usize },
    #[error("bad user: {len} characters exceeds the limit of {max}")]
    UserTooLong { len: usize, max: usize },
    #[error("bad pass: {len} characters exceeds the limit of {max}")]
    PassTooLong { len: usize, max: usize },
}

/// The stored text is not a JSON object of presets.
#[derive(Debug, Error)]
#[error("preset document is not a valid mapping: {0}")]
pub struct DocumentError(#[from] serde_json::Error);

/// Checks `name`, `user` and `pass` against their limits, in that order.
///
/// # Errors
///
/// Returns the [`ValidationError`] for the first field that is out of bounds.
pub fn validate_preset(name: &str, user: &str, pass: &str) -> Result<(), ValidationError> {
    let name_len = name.chars().count();
    if name_len == 0 {
        return Err(ValidationError::EmptyName);
    }
    if name_len > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong {
            len: name_len,
            max: MAX_NAME_LEN,
        });
    }

    let user_len = user.chars().count();
    if user_len > MAX_USER_LEN {
        return Err(ValidationError::UserTooLong {
            len: user_len,
            max: MAX_USER_LEN,
        });
    }

    let pass_len = pass.chars().count();
    if pass_len > MAX_PASS_LEN {
        return Err(ValidationError::PassTooLong {
            len: pass_len,
            max: MAX_PASS_LEN,
        });
    }

    Ok(())
}

/// A structured username/password pair.
///
/// Fields other than `user` and `pass` are carried in `extra` so an entry
/// read from storage serializes back with nothing dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub user: String,
    pub pass: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Preset {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
            extra: Map::new(),
        }
    }
}

/// One value of the preset document.
///
/// Variant order matters: deserialization tries each in turn, and `Other`
/// accepts anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PresetEntry {
    /// Pre-migration value: the bare string is the password.
    Legacy(String),
    /// Current schema.
    Structured(Preset),
    /// Any other JSON value, kept verbatim.
    Other(Value),
}

impl PresetEntry {
    /// Converts the entry to the structured schema.
    ///
    /// A legacy value becomes `{ user: "", pass: <value> }`.  Returns `None`
    /// for a value of any other shape.
    pub fn upgrade(self) -> Option<Preset> {
        match self {
            PresetEntry::Legacy(pass) => Some(Preset::new("", pass)),
            PresetEntry::Structured(preset) => Some(preset),
            PresetEntry::Other(_) => None,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, PresetEntry::Legacy(_))
    }
}

/// The full name → entry mapping persisted as one JSON blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetDocument {
    entries: BTreeMap<String, PresetEntry>,
}

impl PresetDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses stored text.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] unless `text` is a JSON object.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serializes the document to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] if serialization fails.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&PresetEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PresetEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Writes `name → {user, pass}`, returning the previous entry.
    ///
    /// The new value replaces the old one whole: nothing of a legacy string,
    /// an opaque value or extra fields of a structured entry survives.
    pub fn upsert(&mut self, name: &str, user: &str, pass: &str) -> Option<PresetEntry> {
        self.entries.insert(
            name.to_string(),
            PresetEntry::Structured(Preset::new(user, pass)),
        )
    }

    /// Removes `name`, returning its entry if it was present.
    pub fn remove(&mut self, name: &str) -> Option<PresetEntry> {
        self.entries.remove(name)
    }
}

/// Counts the top-level keys of `text` without interpreting the values.
///
/// Returns `None` when `text` is not a JSON object.
pub fn count_top_level_keys(text: &str) -> Option<usize> {
    serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(text)
        .ok()
        .map(|map| map.len())
}
