//! Structured diagnostics for the non-fatal paths of discovery and decoding.

use std::fmt;

use log::{info, warn};
use serde::Serialize;
use uuid::Uuid;

/// A non-fatal event worth surfacing to whoever is observing the client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    UnsupportedService { uuid: Uuid },
    UnsupportedCharacteristic { uuid: Uuid },
    CharacteristicDiscoveryFailed { service: Uuid, reason: String },
    MissingUserDescription { uuid: Uuid },
    InvalidDescriptor { uuid: Uuid, reason: String },
    UnsupportedFormat { uuid: Uuid, code: u8 },
    UnknownUnit { uuid: Uuid, code: u16 },
    ShortValueBuffer { uuid: Uuid, expected: usize, actual: usize },
    ValueReadFailed { uuid: Uuid, reason: String },
    SubscribeFailed { uuid: Uuid, reason: String },
    UntrackedNotification { uuid: Uuid },
}

impl Diagnostic {
    /// Unknown services and characteristics are expected on real hardware.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedService { .. }
                | Self::UnsupportedCharacteristic { .. }
                | Self::MissingUserDescription { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedService { uuid } => {
                write!(f, "Found unsupported service with UUID \"{}\"", uuid)
            }
            Self::UnsupportedCharacteristic { uuid } => {
                write!(f, "Found unsupported characteristic with UUID \"{}\"", uuid)
            }
            Self::CharacteristicDiscoveryFailed { service, reason } => write!(
                f,
                "Failed to get characteristics of service \"{}\": {}",
                service, reason
            ),
            Self::MissingUserDescription { uuid } => {
                write!(f, "No user description for characteristic \"{}\"", uuid)
            }
            Self::InvalidDescriptor { uuid, reason } => write!(
                f,
                "Invalid presentation format for characteristic \"{}\": {}",
                uuid, reason
            ),
            Self::UnsupportedFormat { uuid, code } => write!(
                f,
                "Unsupported format 0x{:02X} for characteristic \"{}\"",
                code, uuid
            ),
            Self::UnknownUnit { uuid, code } => write!(
                f,
                "Unknown unit 0x{:04X} for characteristic \"{}\"",
                code, uuid
            ),
            Self::ShortValueBuffer {
                uuid,
                expected,
                actual,
            } => write!(
                f,
                "Value of \"{}\" too short: expected {} bytes, got {}",
                uuid, expected, actual
            ),
            Self::ValueReadFailed { uuid, reason } => {
                write!(f, "Failed to read value of \"{}\": {}", uuid, reason)
            }
            Self::SubscribeFailed { uuid, reason } => write!(
                f,
                "Failed to start notifications for \"{}\": {}",
                uuid, reason
            ),
            Self::UntrackedNotification { uuid } => write!(
                f,
                "No presentation format cached for UUID \"{}\", notification dropped",
                uuid
            ),
        }
    }
}

/// Receives diagnostics emitted by discovery and the trackers
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl DiagnosticSink for LogDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        if diagnostic.is_benign() {
            info!("{}", diagnostic);
        } else {
            warn!("{}", diagnostic);
        }
    }
}
