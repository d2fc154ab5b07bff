//! Storage infrastructure: key-value backends for the preset document.
//!
//! - `file` persists each preferences namespace as a JSON file (used by the
//!   server binary).
//! - `memory` keeps values in a shared map and can simulate an unavailable
//!   backend or rejected writes (used by tests).

pub mod file;
pub mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;
