//! Status reporter that writes to the log.

use tracing::{info, warn};

use crate::application::status::{ConnectionState, StatusReporter};

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatusReporter;

impl StatusReporter for TracingStatusReporter {
    fn preset_count(&self, count: usize) {
        info!(presets = count, "preset count");
    }

    fn connection(&self, state: &ConnectionState) {
        match state {
            ConnectionState::Connecting { addr } => info!("network: connecting on {addr}"),
            ConnectionState::Connected { addr } => info!("network: listening on {addr}"),
            ConnectionState::Disconnected => warn!("network: disconnected"),
        }
    }
}
