//! HTTP adapter: axum router, listener bring-up and the embedded page.

pub mod server;

pub use server::{
    bind_with_retry, build_router, run_server, serve_listener, ListenerSettings, ServerError,
    SharedGateway,
};

/// Control page served at `/`.
pub const INDEX_HTML: &str = include_str!("../../../assets/index.html");
