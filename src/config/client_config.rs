use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::bluetooth::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, DEFAULT_SCAN_TIMEOUT_SECS,
    DEVICE_NAME,
};
use crate::error::ClientError;

/// How characteristics of a supported service are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    /// Track every characteristic with a valid presentation descriptor
    #[default]
    Descriptor,
    /// Track only characteristics from the built-in allow-list
    AllowList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Advertised name the device must match exactly
    pub device_name: String,

    pub discovery_mode: DiscoveryMode,

    /// Time allowed for finding the device
    pub scan_timeout_secs: u64,

    /// Time allowed for the GATT connect and for service enumeration
    pub connect_timeout_secs: u64,

    /// Time allowed for each descriptor or value read
    pub read_timeout_secs: u64,

    /// Connect as soon as the client starts
    pub auto_connect: bool,

    /// `error`, `warn`, `info`, `debug` or `trace`
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            device_name: DEVICE_NAME.to_string(),
            discovery_mode: DiscoveryMode::default(),
            scan_timeout_secs: DEFAULT_SCAN_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            auto_connect: true,
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn log_level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }

    /// Rejects settings that would make every connection attempt fail.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.device_name.trim().is_empty() {
            return Err(ClientError::Config("device_name must not be empty".into()));
        }
        for (name, secs) in [
            ("scan_timeout_secs", self.scan_timeout_secs),
            ("connect_timeout_secs", self.connect_timeout_secs),
            ("read_timeout_secs", self.read_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ClientError::Config(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }
}
