//! USB HID Usage IDs (page 0x07, Keyboard/Keypad page).
//!
//! These are the codes placed into boot-protocol keyboard reports sent to the
//! host.  Only the keys the device can actually produce are listed: the
//! printable US-layout keys, the few control keys used by text entry and the
//! hotkey chords, and the eight modifiers.
//!
//! Reference: USB HID Usage Tables 1.3, Section 10 (Keyboard/Keypad page 0x07).
//!
//! HID codes describe **physical key positions**, not characters.  Letter A is
//! 0x04 regardless of whether Shift is held; the character that appears on the
//! host depends on the modifiers and on the host's configured layout.  The
//! character table in [`super::us_layout`] assumes the host uses a US layout.

use serde::{Deserialize, Serialize};

use super::modifiers::ModifierFlags;

/// USB HID Usage ID for keyboard keys (page 0x07).
///
/// The numeric value of each variant is its HID Usage ID on the keyboard/keypad page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HidKeyCode {
    // Letters (HID 0x04–0x1D)
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digits (HID 0x1E–0x27)
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Control and punctuation keys (HID 0x28–0x38)
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Backslash = 0x31,
    Semicolon = 0x33,
    Quote = 0x34,
    Backquote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,

    // Navigation cluster
    Delete = 0x4C,

    // Modifier keys (HID 0xE0–0xE7)
    ControlLeft = 0xE0,
    ShiftLeft = 0xE1,
    AltLeft = 0xE2,
    MetaLeft = 0xE3,
    ControlRight = 0xE4,
    ShiftRight = 0xE5,
    AltRight = 0xE6,
    MetaRight = 0xE7,
}

impl HidKeyCode {
    /// Returns the raw USB HID Usage ID value for this key code.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` if this is a modifier key.
    pub fn is_modifier(self) -> bool {
        self.modifier_bit().is_some()
    }

    /// Returns the bit this key occupies in the report's modifier byte, or
    /// `None` for ordinary keys.
    ///
    /// Boot-protocol reports carry modifiers as a bitmap in byte 0 rather
    /// than in the six key slots.
    pub fn modifier_bit(self) -> Option<u8> {
        match self {
            HidKeyCode::ControlLeft => Some(ModifierFlags::LEFT_CTRL),
            HidKeyCode::ShiftLeft => Some(ModifierFlags::LEFT_SHIFT),
            HidKeyCode::AltLeft => Some(ModifierFlags::LEFT_ALT),
            HidKeyCode::MetaLeft => Some(ModifierFlags::LEFT_META),
            HidKeyCode::ControlRight => Some(ModifierFlags::RIGHT_CTRL),
            HidKeyCode::ShiftRight => Some(ModifierFlags::RIGHT_SHIFT),
            HidKeyCode::AltRight => Some(ModifierFlags::RIGHT_ALT),
            HidKeyCode::MetaRight => Some(ModifierFlags::RIGHT_META),
            _ => None,
        }
    }
}
