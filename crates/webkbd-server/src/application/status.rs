//! Status reporting seam.
//!
//! The reporter is told about state changes (preset count, network state) so
//! it can show them on a display or in the log.  It never feeds anything
//! back into request handling.

use std::net::SocketAddr;

/// State of the service's network listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Trying to bind the listener.
    Connecting { addr: SocketAddr },
    /// Listening for requests.
    Connected { addr: SocketAddr },
    /// Not reachable over the network.
    Disconnected,
}

/// Receives status updates.
#[cfg_attr(test, mockall::automock)]
pub trait StatusReporter: Send + Sync {
    /// Number of presets now stored.
    fn preset_count(&self, count: usize);

    /// Listener state changed.
    fn connection(&self, state: &ConnectionState);
}
