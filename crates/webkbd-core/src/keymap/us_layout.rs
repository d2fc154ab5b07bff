//! Character → key stroke table for a host configured with a US keyboard layout.
//!
//! Only 7-bit ASCII is representable.  Line feed produces Enter; carriage
//! return produces nothing, so a CRLF pair types a single Enter.

use super::hid::HidKeyCode;
use super::modifiers::ModifierFlags;

/// A single key press needed to produce one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub key: HidKeyCode,
    pub modifiers: ModifierFlags,
}

impl KeyStroke {
    const fn plain(key: HidKeyCode) -> Self {
        Self {
            key,
            modifiers: ModifierFlags::NONE,
        }
    }

    const fn shifted(key: HidKeyCode) -> Self {
        Self {
            key,
            modifiers: ModifierFlags::SHIFT,
        }
    }
}

/// Returns `true` for characters the emitter drops on purpose rather than
/// because they are unmappable.
pub fn is_silent(c: char) -> bool {
    c == '\r'
}

/// Maps `c` to the key stroke that types it, or `None` if the character has
/// no key on a US layout.
pub fn char_to_keystroke(c: char) -> Option<KeyStroke> {
    use HidKeyCode as K;

    let stroke = match c {
        'a'..='z' => KeyStroke::plain(letter(c as u8 - b'a')),
        'A'..='Z' => KeyStroke::shifted(letter(c as u8 - b'A')),
        '1'..='9' => KeyStroke::plain(digit(c as u8 - b'1')),
        '0' => KeyStroke::plain(K::Digit0),

        '\n' => KeyStroke::plain(K::Enter),
        '\t' => KeyStroke::plain(K::Tab),
        '\u{8}' => KeyStroke::plain(K::Backspace),
        '\u{1b}' => KeyStroke::plain(K::Escape),
        '\u{7f}' => KeyStroke::plain(K::Delete),
        ' ' => KeyStroke::plain(K::Space),

        '-' => KeyStroke::plain(K::Minus),
        '=' => KeyStroke::plain(K::Equal),
        '[' => KeyStroke::plain(K::BracketLeft),
        ']' => KeyStroke::plain(K::BracketRight),
        '\\' => KeyStroke::plain(K::Backslash),
        ';' => KeyStroke::plain(K::Semicolon),
        '\'' => KeyStroke::plain(K::Quote),
        '`' => KeyStroke::plain(K::Backquote),
        ',' => KeyStroke::plain(K::Comma),
        '.' => KeyStroke::plain(K::Period),
        '/' => KeyStroke::plain(K::Slash),

        '!' => KeyStroke::shifted(K::Digit1),
        '@' => KeyStroke::shifted(K::Digit2),
        '#' => KeyStroke::shifted(K::Digit3),
        '$' => KeyStroke::shifted(K::Digit4),
        '%' => KeyStroke::shifted(K::Digit5),
        '^' => KeyStroke::shifted(K::Digit6),
        '&' => KeyStroke::shifted(K::Digit7),
        '*' => KeyStroke::shifted(K::Digit8),
        '(' => KeyStroke::shifted(K::Digit9),
        ')' => KeyStroke::shifted(K::Digit0),
        '_' => KeyStroke::shifted(K::Minus),
        '+' => KeyStroke::shifted(K::Equal),
        '{' => KeyStroke::shifted(K::BracketLeft),
        '}' => KeyStroke::shifted(K::BracketRight),
        '|' => KeyStroke::shifted(K::Backslash),
        ':' => KeyStroke::shifted(K::Semicolon),
        '"' => KeyStroke::shifted(K::Quote),
        '~' => KeyStroke::shifted(K::Backquote),
        '<' => KeyStroke::shifted(K::Comma),
        '>' => KeyStroke::shifted(K::Period),
        '?' => KeyStroke::shifted(K::Slash),

        _ => return None,
    };
    Some(stroke)
}

fn letter(offset: u8) -> HidKeyCode {
    const LETTERS: [HidKeyCode; 26] = [
        HidKeyCode::KeyA,
        HidKeyCode::KeyB,
        HidKeyCode::KeyC,
        HidKeyCode::KeyD,
        HidKeyCode::KeyE,
        HidKeyCode::KeyF,
        HidKeyCode::KeyG,
        HidKeyCode::KeyH,
        HidKeyCode::KeyI,
        HidKeyCode::KeyJ,
        HidKeyCode::KeyK,
        HidKeyCode::KeyL,
        HidKeyCode::KeyM,
        HidKeyCode::KeyN,
        HidKeyCode::KeyO,
        HidKeyCode::KeyP,
        HidKeyCode::KeyQ,
        HidKeyCode::KeyR,
        HidKeyCode::KeyS,
        HidKeyCode::KeyT,
        HidKeyCode::KeyU,
        HidKeyCode::KeyV,
        HidKeyCode::KeyW,
        HidKeyCode::KeyX,
        HidKeyCode::KeyY,
        HidKeyCode::KeyZ,
    ];
    LETTERS[offset as usize]
}

fn digit(offset: u8) -> HidKeyCode {
    // '1'..='9' only; '0' sits after '9' in HID order.
    const DIGITS: [HidKeyCode; 9] = [
        HidKeyCode::Digit1,
        HidKeyCode::Digit2,
        HidKeyCode::Digit3,
        HidKeyCode::Digit4,
        HidKeyCode::Digit5,
        HidKeyCode::Digit6,
        HidKeyCode::Digit7,
        HidKeyCode::Digit8,
        HidKeyCode::Digit9,
    ];
    DIGITS[offset as usize]
}
