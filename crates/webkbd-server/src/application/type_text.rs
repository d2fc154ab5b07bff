//! TypeTextUseCase: turns a text payload into key presses on the host.
//!
//! Every dispatch follows the same sequence:
//!
//! 1. Release everything, then wait `release_settle` so a key left held by
//!    an earlier aborted dispatch is seen as released by the host.
//! 2. If the whole text is a hotkey alias (see [`Hotkey`]), press the chord,
//!    wait `chord_settle`, release everything.  Otherwise type each
//!    character, then CRLF if a newline was requested.
//! 3. Wait `pacing` before returning.
//!
//! All waits go through the injected [`Clock`] and block the caller.  The
//! host polls the keyboard at a fixed rate; sending the next request's
//! reports before it has caught up loses keystrokes.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};
use webkbd_core::keymap::{
    char_to_keystroke, us_layout::is_silent, HidKeyCode, Hotkey, ModifierFlags,
};

/// Error type for keystroke emission.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The keyboard device could not be opened or written.
    #[error("keyboard device {path} unavailable: {source}")]
    Device {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("emitter error: {0}")]
    Platform(String),
}

/// Sink for keyboard events (USB HID gadget, log, test recorder).
pub trait KeystrokeEmitter: Send + Sync {
    /// Presses `key`.  `modifiers` is the full modifier state held from now on.
    fn emit_key_down(&self, key: HidKeyCode, modifiers: ModifierFlags) -> Result<(), EmitError>;

    /// Releases `key`.  `modifiers` is the modifier state that stays held.
    fn emit_key_up(&self, key: HidKeyCode, modifiers: ModifierFlags) -> Result<(), EmitError>;

    /// Releases every key and modifier.
    fn release_all(&self) -> Result<(), EmitError>;
}

/// Source of blocking waits.
pub trait Clock: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Named delays on the dispatch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingDelays {
    /// After the initial release-all.
    pub release_settle: Duration,
    /// While a hotkey chord is held.
    pub chord_settle: Duration,
    /// After every dispatch.
    pub pacing: Duration,
}

impl Default for TypingDelays {
    fn default() -> Self {
        Self {
            release_settle: Duration::from_millis(10),
            chord_settle: Duration::from_millis(100),
            pacing: Duration::from_millis(40),
        }
    }
}

/// What a dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOutcome {
    Hotkey(Hotkey),
    Typed { typed: usize, skipped: usize },
}

pub struct TypeTextUseCase {
    emitter: Arc<dyn KeystrokeEmitter>,
    clock: Arc<dyn Clock>,
    delays: TypingDelays,
}

impl TypeTextUseCase {
    pub fn new(
        emitter: Arc<dyn KeystrokeEmitter>,
        clock: Arc<dyn Clock>,
        delays: TypingDelays,
    ) -> Self {
        Self {
            emitter,
            clock,
            delays,
        }
    }

    pub fn delays(&self) -> TypingDelays {
        self.delays
    }

    /// Emits `text` (or the hotkey it names), optionally followed by CRLF.
    ///
    /// The pacing delay is applied even when emission fails part-way.
    ///
    /// # Errors
    ///
    /// Returns the first [`EmitError`] reported by the emitter.
    pub fn type_text(&self, text: &str, newline: bool) -> Result<TypeOutcome, EmitError> {
        let result = self.dispatch(text, newline);
        self.clock.sleep(self.delays.pacing);
        result
    }

    fn dispatch(&self, text: &str, newline: bool) -> Result<TypeOutcome, EmitError> {
        self.emitter.release_all()?;
        self.clock.sleep(self.delays.release_settle);

        if let Some(hotkey) = Hotkey::parse(text) {
            self.send_chord(hotkey)?;
            return Ok(TypeOutcome::Hotkey(hotkey));
        }

        let mut typed = 0;
        let mut skipped = 0;
        let suffix = if newline { "\r\n" } else { "" };
        for c in text.chars().chain(suffix.chars()) {
            if is_silent(c) {
                continue;
            }
            match char_to_keystroke(c) {
                Some(stroke) => {
                    self.emitter.emit_key_down(stroke.key, stroke.modifiers)?;
                    self.emitter.emit_key_up(stroke.key, ModifierFlags::NONE)?;
                    typed += 1;
                }
                None => {
                    warn!("no key for character U+{:04X}; skipped", c as u32);
                    skipped += 1;
                }
            }
        }

        Ok(TypeOutcome::Typed { typed, skipped })
    }

    fn send_chord(&self, hotkey: Hotkey) -> Result<(), EmitError> {
        debug!("sending {}", hotkey.label());

        let mut held = ModifierFlags::NONE;
        for &modifier in hotkey.modifier_keys() {
            if let Some(bit) = modifier.modifier_bit() {
                held = held.with(ModifierFlags(bit));
            }
            self.emitter.emit_key_down(modifier, held)?;
        }
        self.emitter.emit_key_down(hotkey.key(), held)?;

        self.clock.sleep(self.delays.chord_settle);
        self.emitter.release_all()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
