//! Dry-run emitter that only logs key events.
//!
//! Useful on a development host without a USB gadget: requests behave
//! exactly as on the device, including all delays, but nothing is typed.

use tracing::debug;
use webkbd_core::keymap::{HidKeyCode, ModifierFlags};

use crate::application::type_text::{EmitError, KeystrokeEmitter};

#[derive(Debug, Default, Clone, Copy)]
pub struct LogEmitter;

impl KeystrokeEmitter for LogEmitter {
    fn emit_key_down(&self, key: HidKeyCode, modifiers: ModifierFlags) -> Result<(), EmitError> {
        debug!(key = ?key, modifiers = modifiers.0, "key down");
        Ok(())
    }

    fn emit_key_up(&self, key: HidKeyCode, modifiers: ModifierFlags) -> Result<(), EmitError> {
        debug!(key = ?key, modifiers = modifiers.0, "key up");
        Ok(())
    }

    fn release_all(&self) -> Result<(), EmitError> {
        debug!("release all");
        Ok(())
    }
}
