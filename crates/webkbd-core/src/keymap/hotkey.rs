//! Hotkey shortcuts recognised in place of literal text.
//!
//! A request whose whole text (ignoring surrounding whitespace and case) is
//! one of the aliases below sends a modifier chord instead of typing the
//! characters.
//!
//! | Hotkey        | Aliases                                  |
//! |---------------|------------------------------------------|
//! | Ctrl-C        | `"\x03"`, `CTRL-C`, `{CTRL+C}`           |
//! | Ctrl-X        | `"\x18"`, `CTRL-X`, `{CTRL+X}`           |
//! | Ctrl-Alt-Del  | `CTRL-ALT-DEL`, `{CTRL+ALT+DEL}`         |
//!
//! Ctrl-Alt-Del has no ASCII control character, so it only has the two
//! spelled-out forms.

use super::hid::HidKeyCode;
use super::modifiers::ModifierFlags;

/// A chord the device can send on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotkey {
    CtrlC,
    CtrlX,
    CtrlAltDel,
}

const CTRL_C_ALIASES: &[&str] = &["\u{3}", "ctrl-c", "{ctrl+c}"];
const CTRL_X_ALIASES: &[&str] = &["\u{18}", "ctrl-x", "{ctrl+x}"];
const CTRL_ALT_DEL_ALIASES: &[&str] = &["ctrl-alt-del", "{ctrl+alt+del}"];

impl Hotkey {
    /// Recognises `text` as a hotkey alias.
    pub fn parse(text: &str) -> Option<Hotkey> {
        // ETX and CAN are not Unicode whitespace, so trimming keeps them.
        let lowered = text.trim().to_ascii_lowercase();
        let matches = |aliases: &[&str]| aliases.iter().any(|a| *a == lowered);

        if matches(CTRL_C_ALIASES) {
            Some(Hotkey::CtrlC)
        } else if matches(CTRL_X_ALIASES) {
            Some(Hotkey::CtrlX)
        } else if matches(CTRL_ALT_DEL_ALIASES) {
            Some(Hotkey::CtrlAltDel)
        } else {
            None
        }
    }

    /// Modifier bitmap held while the chord key is pressed.
    pub fn modifiers(self) -> ModifierFlags {
        match self {
            Hotkey::CtrlC | Hotkey::CtrlX => ModifierFlags(ModifierFlags::LEFT_CTRL),
            Hotkey::CtrlAltDel => {
                ModifierFlags(ModifierFlags::LEFT_CTRL | ModifierFlags::LEFT_ALT)
            }
        }
    }

    /// The non-modifier key of the chord.
    pub fn key(self) -> HidKeyCode {
        match self {
            Hotkey::CtrlC => HidKeyCode::KeyC,
            Hotkey::CtrlX => HidKeyCode::KeyX,
            Hotkey::CtrlAltDel => HidKeyCode::Delete,
        }
    }

    /// Modifier keys to press, in press order.
    pub fn modifier_keys(self) -> &'static [HidKeyCode] {
        match self {
            Hotkey::CtrlC | Hotkey::CtrlX => &[HidKeyCode::ControlLeft],
            Hotkey::CtrlAltDel => &[HidKeyCode::ControlLeft, HidKeyCode::AltLeft],
        }
    }

    /// Short label used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            Hotkey::CtrlC => "Ctrl-C",
            Hotkey::CtrlX => "Ctrl-X",
            Hotkey::CtrlAltDel => "Ctrl-Alt-Del",
        }
    }
}
