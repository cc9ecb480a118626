//! Error types for the SmartGlove client.

use thiserror::Error;

/// Errors produced by the connection state machine and the value decoders.
///
/// Only the connection-level variants (`PlatformUnsupported`, `UserCancelled`,
/// `ConnectionFailed`, `Timeout`) ever reach the user. Everything scoped to a
/// single characteristic is turned into a [`crate::core::Diagnostic`] instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Bluetooth LE is not supported on this platform")]
    PlatformUnsupported,

    #[error("device selection was cancelled")]
    UserCancelled,

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("timed out while {0}")]
    Timeout(&'static str),

    #[error("presentation descriptor too short: {len} bytes")]
    InvalidDescriptor { len: usize },

    #[error("value buffer too short: expected {expected} bytes, got {actual}")]
    ShortValueBuffer { expected: usize, actual: usize },

    #[error("unsupported presentation format 0x{0:02X}")]
    UnsupportedFormat(u8),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<bluest::Error> for ClientError {
    fn from(e: bluest::Error) -> Self {
        Self::Platform(e.to_string())
    }
}
