//! Keystroke emitter implementations.
//!
//! - `hid_gadget` writes boot-protocol reports to a Linux USB HID gadget.
//! - `log` logs events without typing anything.
//! - `mock` records events for tests.

pub mod hid_gadget;
pub mod log;
pub mod mock;

pub use hid_gadget::HidGadgetEmitter;
pub use log::LogEmitter;
pub use mock::MockKeystrokeEmitter;
