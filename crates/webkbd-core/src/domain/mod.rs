//! Domain entities for the web virtual keyboard.
//!
//! Pure data and rules with no infrastructure dependencies: nothing here
//! touches storage, sockets or the keyboard device, so everything can be
//! tested on any platform without setup.

/// Credential presets, their stored document, and write-time limits.
pub mod preset;

pub use preset::{
    count_top_level_keys, validate_preset, DocumentError, Preset, PresetDocument, PresetEntry,
    ValidationError, MAX_NAME_LEN, MAX_PASS_LEN, MAX_USER_LEN,
};
