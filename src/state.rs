//! Application state management
//! This module wires the platform, sinks and config into a connection manager.

use std::sync::Arc;

use log::{info, warn};

use crate::config::AppConfig;
use crate::core::bluetooth::{BlePlatform, BluestPlatform};
use crate::core::{ConnectionManager, DiagnosticSink, DisplaySink, JsonLinesSink, LogDiagnostics};

/// Global application state
pub struct AppState {
    pub config: AppConfig,
    /// The connection manager instance
    pub connection_manager: ConnectionManager,
}

impl AppState {
    /// Creates the state backed by the system Bluetooth adapter. A missing
    /// adapter is not an error here; connecting will report it instead.
    pub async fn new(config: AppConfig) -> Self {
        info!("Initializing Bluetooth platform...");
        let platform: Option<Arc<dyn BlePlatform>> = match BluestPlatform::new().await {
            Ok(platform) => Some(Arc::new(platform)),
            Err(e) => {
                warn!("Bluetooth LE unavailable: {}", e);
                None
            }
        };

        Self::with_platform(
            config,
            platform,
            Arc::new(JsonLinesSink::stdout()),
            Arc::new(LogDiagnostics),
        )
    }

    pub fn with_platform(
        config: AppConfig,
        platform: Option<Arc<dyn BlePlatform>>,
        sink: Arc<dyn DisplaySink>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let connection_manager =
            ConnectionManager::new(platform, sink, diagnostics, config.client.clone());
        Self {
            config,
            connection_manager,
        }
    }

    /// Gets a handle to the connection manager
    pub fn connection_manager(&self) -> ConnectionManager {
        self.connection_manager.clone()
    }
}
