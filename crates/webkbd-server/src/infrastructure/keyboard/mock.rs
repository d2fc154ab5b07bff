//! Mock keystroke emitter for tests.
//!
//! Records every call in order so assertions can check exactly which reports
//! would have reached the host.  A failing variant returns
//! [`EmitError::Platform`] from every method to exercise error paths.

use std::sync::Mutex;

use webkbd_core::keymap::{HidKeyCode, ModifierFlags};

use crate::application::type_text::{EmitError, KeystrokeEmitter};

/// One recorded emitter call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmittedEvent {
    KeyDown(HidKeyCode, ModifierFlags),
    KeyUp(HidKeyCode, ModifierFlags),
    ReleaseAll,
}

/// Records all calls without touching a device.
#[derive(Default)]
pub struct MockKeystrokeEmitter {
    events: Mutex<Vec<EmittedEvent>>,
    /// When `true`, every method immediately returns an error.
    pub should_fail: bool,
}

impl MockKeystrokeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// All recorded events, oldest first.
    pub fn events(&self) -> Vec<EmittedEvent> {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Keys from key-down events, in press order.
    pub fn pressed_keys(&self) -> Vec<HidKeyCode> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                EmittedEvent::KeyDown(key, _) => Some(key),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: EmittedEvent) -> Result<(), EmitError> {
        if self.should_fail {
            return Err(EmitError::Platform("mock failure".into()));
        }
        self.events
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(event);
        Ok(())
    }
}

impl KeystrokeEmitter for MockKeystrokeEmitter {
    fn emit_key_down(&self, key: HidKeyCode, modifiers: ModifierFlags) -> Result<(), EmitError> {
        self.record(EmittedEvent::KeyDown(key, modifiers))
    }

    fn emit_key_up(&self, key: HidKeyCode, modifiers: ModifierFlags) -> Result<(), EmitError> {
        self.record(EmittedEvent::KeyUp(key, modifiers))
    }

    fn release_all(&self) -> Result<(), EmitError> {
        self.record(EmittedEvent::ReleaseAll)
    }
}
