//! Key tables for turning text into USB HID keyboard input.
//!
//! The canonical representation is USB HID Usage IDs (page 0x07, Keyboard/Keypad).
//! Characters are translated to HID key strokes at the emission boundary.

pub mod hid;
pub mod hotkey;
pub mod modifiers;
pub mod us_layout;

pub use hid::HidKeyCode;
pub use hotkey::Hotkey;
pub use modifiers::ModifierFlags;
pub use us_layout::{char_to_keystroke, KeyStroke};
