//! `bluest` handles wrapped behind the platform traits

use std::sync::Arc;

use bluest::{Adapter, Characteristic, ConnectionEvent, Device, Service};
use futures_util::{future, StreamExt};
use log::{info, warn};
use uuid::Uuid;

use crate::core::bluetooth::platform::{
    GattCharacteristic, GattDevice, GattService, NotificationStream,
};
use crate::error::ClientError;

/// A SmartGlove found by [`crate::core::bluetooth::BluestPlatform`]
pub struct BluestDevice {
    adapter: Adapter,
    device: Device,
}

impl BluestDevice {
    pub fn new(adapter: Adapter, device: Device) -> Self {
        Self { adapter, device }
    }
}

#[async_trait::async_trait]
impl GattDevice for BluestDevice {
    fn id(&self) -> String {
        self.device.id().to_string()
    }

    fn name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "Unknown".to_string())
    }

    async fn connect(&self) -> Result<(), ClientError> {
        if !self.device.is_connected().await {
            info!("Initiating connection to {}...", self.id());
            self.adapter.connect_device(&self.device).await?;
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ClientError> {
        if self.device.is_connected().await {
            info!("Disconnecting from device {}", self.id());
            self.adapter.disconnect_device(&self.device).await?;
            info!("Successfully disconnected");
        } else {
            info!("Device {} not connected", self.id());
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.device.is_connected().await
    }

    async fn primary_services(&self) -> Result<Vec<Arc<dyn GattService>>, ClientError> {
        let services = self.device.discover_services().await?;
        Ok(services
            .into_iter()
            .map(|service| Arc::new(BluestService { service }) as Arc<dyn GattService>)
            .collect())
    }

    async fn disconnected(&self) -> Result<(), ClientError> {
        let mut events = self
            .adapter
            .device_connection_events(&self.device)
            .await?;
        while let Some(event) = events.next().await {
            if matches!(event, ConnectionEvent::Disconnected) {
                return Ok(());
            }
        }
        Ok(())
    }
}

pub struct BluestService {
    service: Service,
}

#[async_trait::async_trait]
impl GattService for BluestService {
    fn uuid(&self) -> Uuid {
        self.service.uuid()
    }

    async fn characteristics(&self) -> Result<Vec<Arc<dyn GattCharacteristic>>, ClientError> {
        let characteristics = self.service.discover_characteristics().await?;
        Ok(characteristics
            .into_iter()
            .map(|characteristic| {
                Arc::new(BluestCharacteristic { characteristic }) as Arc<dyn GattCharacteristic>
            })
            .collect())
    }
}

pub struct BluestCharacteristic {
    characteristic: Characteristic,
}

#[async_trait::async_trait]
impl GattCharacteristic for BluestCharacteristic {
    fn uuid(&self) -> Uuid {
        self.characteristic.uuid()
    }

    async fn read_value(&self) -> Result<Vec<u8>, ClientError> {
        Ok(self.characteristic.read().await?)
    }

    async fn read_descriptor(&self, descriptor: Uuid) -> Result<Vec<u8>, ClientError> {
        let descriptors = self.characteristic.discover_descriptors().await?;
        let found = descriptors
            .into_iter()
            .find(|d| d.uuid() == descriptor)
            .ok_or_else(|| ClientError::Platform(format!("descriptor {} not found", descriptor)))?;
        Ok(found.read().await?)
    }

    async fn notifications(&self) -> Result<NotificationStream<'_>, ClientError> {
        let uuid = self.characteristic.uuid();
        let stream = self.characteristic.notify().await?;
        Ok(stream
            .filter_map(move |result| {
                future::ready(match result {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!("Error in notification stream of {}: {}", uuid, e);
                        None
                    }
                })
            })
            .boxed())
    }
}
