//! Infrastructure layer for webkbd-server.
//!
//! Everything that touches the outside world lives here: the HTTP listener,
//! the preferences file, the HID gadget device, the wall clock, the log.

pub mod clock;
pub mod config;
pub mod http;
pub mod keyboard;
pub mod status;
pub mod storage;

pub use http::run_server;
