//! webkbd-server library crate.
//!
//! An authenticated HTTP service that types text into the attached host
//! through a USB HID keyboard gadget and keeps named username/password
//! presets in a persisted JSON document.
//!
//! # Architecture
//!
//! ```text
//! Browser (HTTP Basic auth, url-encoded forms)
//!         ↕
//! [webkbd-server]
//!   ├── application/       RequestGateway, PresetStore, TypeTextUseCase
//!   └── infrastructure/
//!         ├── http/        axum router and listener
//!         ├── storage/     file and in-memory key-value backends
//!         ├── keyboard/    HID gadget, log and mock emitters
//!         ├── clock        real and recording clocks
//!         ├── status       tracing status reporter
//!         └── config       TOML configuration
//!         ↕
//! Host computer (USB HID boot keyboard)
//! ```
//!
//! Pure types (preset model, key codes, hotkeys) come from `webkbd-core`.

/// Application layer: use cases and the ports they need.
pub mod application;

/// Infrastructure layer: adapters for HTTP, storage, devices and config.
pub mod infrastructure;
