//! Device acquisition on top of `bluest`
//! Finds the SmartGlove either among already connected devices or by scanning
//! advertisements for its name.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use bluest::{Adapter, Device};
use futures_util::StreamExt;
use log::{debug, info};
use regex::Regex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::bluetooth::device::BluestDevice;
use crate::core::bluetooth::platform::{BlePlatform, GattDevice};
use crate::error::ClientError;

/// The `bluest` backed platform
pub struct BluestPlatform {
    adapter: Adapter,
    cancel_token: Mutex<CancellationToken>,
}

impl BluestPlatform {
    /// Opens the default adapter and waits until it is powered on.
    pub async fn new() -> Result<Self> {
        let adapter = Adapter::default()
            .await
            .ok_or_else(|| anyhow!("No Bluetooth adapter found"))?;
        adapter.wait_available().await?;
        info!("Bluetooth adapter is available.");

        Ok(Self {
            adapter,
            cancel_token: Mutex::new(CancellationToken::new()),
        })
    }

    fn fresh_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut guard = match self.cancel_token.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = token.clone();
        token
    }

    async fn scan_for(
        &self,
        name_filter: &str,
        allowed_services: &[Uuid],
        cancel_token: CancellationToken,
    ) -> Result<Device, ClientError> {
        // find connected device first
        info!("Checking for connected devices");
        for device in self
            .adapter
            .connected_devices_with_services(allowed_services)
            .await?
        {
            if is_named(&device, name_filter) {
                return Ok(device);
            }
        }
        info!("No connected {} detected", name_filter);

        info!("Starting bluetooth scan");
        let mut scan_stream = self.adapter.scan(&[]).await?;

        loop {
            tokio::select! {
                result = scan_stream.next() => {
                    match result {
                        Some(discovered) => {
                            debug!("Found device - Device: {:?}, RSSI: {:?}", discovered.device, discovered.rssi);
                            let named = discovered.adv_data.local_name.as_deref() == Some(name_filter)
                                || is_named(&discovered.device, name_filter);
                            if named && offers_allowed_service(&discovered.adv_data.services, allowed_services) {
                                return Ok(discovered.device);
                            }
                        }
                        None => {
                            info!("Bluetooth scan stream has ended.");
                            return Err(ClientError::ConnectionFailed(format!(
                                "no device named {} found",
                                name_filter
                            )));
                        }
                    }
                }
                _ = cancel_token.cancelled() => {
                    info!("Device selection cancelled.");
                    return Err(ClientError::UserCancelled);
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl BlePlatform for BluestPlatform {
    async fn request_device(
        &self,
        name_filter: &str,
        allowed_services: &[Uuid],
    ) -> Result<Arc<dyn GattDevice>, ClientError> {
        debug!("Requesting device {} with services {:?}", name_filter, allowed_services);
        let cancel_token = self.fresh_token();
        let device = self
            .scan_for(name_filter, allowed_services, cancel_token)
            .await?;

        let id = device.id().to_string();
        let address = extract_mac_address(&id).unwrap_or_else(|| "N/A".to_string());
        info!("Found {} device: Address: {}, ID: {}", name_filter, address, id);

        Ok(Arc::new(BluestDevice::new(self.adapter.clone(), device)))
    }

    fn cancel_request(&self) {
        let guard = match self.cancel_token.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.cancel();
    }
}

fn is_named(device: &Device, name_filter: &str) -> bool {
    device
        .name()
        .map(|name| name == name_filter)
        .unwrap_or(false)
}

/// Advertisements often omit service UUIDs; only a non-empty list that
/// misses every allowed service rules a device out.
fn offers_allowed_service(advertised: &[Uuid], allowed: &[Uuid]) -> bool {
    advertised.is_empty() || advertised.iter().any(|uuid| allowed.contains(uuid))
}

/// Pulls a MAC address out of a platform device id, when it carries one.
pub fn extract_mac_address(device_id: &str) -> Option<String> {
    let re = Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})").ok()?;
    re.find_iter(device_id)
        .last()
        .map(|m| m.as_str().to_uppercase())
}
