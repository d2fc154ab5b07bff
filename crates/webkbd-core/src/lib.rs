//! # webkbd-core
//!
//! Shared foundation for the web virtual keyboard: the credential preset
//! model and the key tables used to turn text into USB HID keyboard input.
//!
//! This crate has no dependencies on OS APIs, storage, or network sockets.
//!
//! - **`domain`** – Presets, the JSON document that stores them (including the
//!   legacy bare-string schema), and the write-time length limits.
//!
//! - **`keymap`** – USB HID Usage IDs, the boot-report modifier bitmap, the
//!   US-layout character table, and the hotkey aliases (Ctrl-C, Ctrl-X,
//!   Ctrl-Alt-Del).

pub mod domain;
pub mod keymap;

pub use domain::preset::{
    validate_preset, DocumentError, Preset, PresetDocument, PresetEntry, ValidationError,
};
pub use keymap::{HidKeyCode, Hotkey, KeyStroke, ModifierFlags};
