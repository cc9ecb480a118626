//! Defines shared data structures for the Bluetooth module.

use serde::Serialize;

/// Result of a connect request that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectOutcome {
    /// A new session was established with the named device
    Connected { device_name: String },
    /// A session already exists; nothing was done
    AlreadyConnected,
    /// Another attempt is in flight; this one was rejected
    AlreadyConnecting,
}

/// Observable state of the connection manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Connected {
        device_id: String,
        device_name: String,
        tracked_characteristics: usize,
    },
}
