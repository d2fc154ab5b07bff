//! Linux USB HID gadget emitter.
//!
//! When the board runs as a USB device with a keyboard function configured
//! through configfs, the kernel exposes the function as a character device
//! (usually `/dev/hidg0`).  Each write of an 8-byte boot-protocol report
//! tells the host which keys are currently down:
//!
//! ```text
//! byte 0     modifier bitmap (see ModifierFlags)
//! byte 1     reserved, always 0
//! bytes 2-7  up to six HID usage IDs of pressed keys, 0 = empty slot
//! ```
//!
//! A key press is a report containing the key; the release is the next
//! report without it.  The device is opened for every report and closed
//! again right after.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::trace;
use webkbd_core::keymap::{HidKeyCode, ModifierFlags};

use crate::application::type_text::{EmitError, KeystrokeEmitter};

/// Default gadget device path.
pub const DEFAULT_DEVICE: &str = "/dev/hidg0";

const KEY_SLOTS: usize = 6;

/// Keys currently reported as down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ReportState {
    modifiers: ModifierFlags,
    keys: [u8; KEY_SLOTS],
}

impl ReportState {
    fn press(&mut self, key: HidKeyCode, modifiers: ModifierFlags) {
        self.modifiers = modifiers;
        if key.is_modifier() {
            return;
        }
        let code = key.as_u8();
        if self.keys.contains(&code) {
            return;
        }
        // More than six simultaneous keys are dropped.
        if let Some(slot) = self.keys.iter_mut().find(|k| **k == 0) {
            *slot = code;
        }
    }

    fn release(&mut self, key: HidKeyCode, modifiers: ModifierFlags) {
        self.modifiers = modifiers;
        let code = key.as_u8();
        for slot in self.keys.iter_mut().filter(|k| **k == code) {
            *slot = 0;
        }
    }

    fn to_report(self) -> [u8; 8] {
        let mut report = [0u8; 8];
        report[0] = self.modifiers.0;
        report[2..].copy_from_slice(&self.keys);
        report
    }
}

/// Writes boot-protocol keyboard reports to a HID gadget device.
pub struct HidGadgetEmitter {
    device: PathBuf,
    state: Mutex<ReportState>,
}

impl HidGadgetEmitter {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            state: Mutex::new(ReportState::default()),
        }
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    fn update(&self, change: impl FnOnce(&mut ReportState)) -> Result<(), EmitError> {
        let report = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| EmitError::Platform("report state lock poisoned".into()))?;
            change(&mut state);
            state.to_report()
        };
        self.write_report(&report)
    }

    fn write_report(&self, report: &[u8; 8]) -> Result<(), EmitError> {
        trace!("hid report {report:02X?}");
        let mut file = OpenOptions::new()
            .write(true)
            .open(&self.device)
            .map_err(|source| EmitError::Device {
                path: self.device.clone(),
                source,
            })?;
        file.write_all(report).map_err(|source| EmitError::Device {
            path: self.device.clone(),
            source,
        })
    }
}

impl KeystrokeEmitter for HidGadgetEmitter {
    fn emit_key_down(&self, key: HidKeyCode, modifiers: ModifierFlags) -> Result<(), EmitError> {
        self.update(|s| s.press(key, modifiers))
    }

    fn emit_key_up(&self, key: HidKeyCode, modifiers: ModifierFlags) -> Result<(), EmitError> {
        self.update(|s| s.release(key, modifiers))
    }

    fn release_all(&self) -> Result<(), EmitError> {
        self.update(|s| *s = ReportState::default())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
