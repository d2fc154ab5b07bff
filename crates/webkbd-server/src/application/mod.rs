//! Application layer for webkbd-server.
//!
//! Knows *what* each request does: authenticate, edit the preset document,
//! type text.  Storage, keyboard devices, clocks and status output are
//! reached only through the traits defined here and implemented in
//! `infrastructure`.

pub mod auth;
pub mod gateway;
pub mod preset_store;
pub mod status;
pub mod type_text;

pub use auth::Credentials;
pub use gateway::{GatewayRequest, GatewayResponse, RequestGateway, Route};
pub use preset_store::{KeyValueBackend, PresetError, PresetStore, StorageError};
pub use status::{ConnectionState, StatusReporter};
pub use type_text::{Clock, EmitError, KeystrokeEmitter, TypeTextUseCase, TypingDelays};
