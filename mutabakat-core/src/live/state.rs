//! Live channel connection state

use serde::{Deserialize, Serialize};

/// Connection state of a [`super::LiveChannelManager`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveChannelState {
    /// No transport and no pending reconnect
    #[default]
    Disconnected,
    /// Opening a transport
    Connecting,
    /// Transport open, liveness probe armed
    Connected,
    /// Transport closed, reconnect timer armed
    ReconnectPending,
}

impl LiveChannelState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}
