//! The Bluetooth capability the client consumes.
//! The connection state machine only talks to these traits, so it can run
//! against `bluest` or against an in-memory device in tests.

use std::sync::Arc;

use futures_util::stream::BoxStream;
use uuid::Uuid;

use crate::error::ClientError;

/// Stream of raw notification payloads for one characteristic
pub type NotificationStream<'a> = BoxStream<'a, Vec<u8>>;

/// Entry point of the platform Bluetooth stack
#[async_trait::async_trait]
pub trait BlePlatform: Send + Sync {
    /// Finds a device advertising `name_filter`. Only `allowed_services`
    /// need to be accessible afterwards.
    async fn request_device(
        &self,
        name_filter: &str,
        allowed_services: &[Uuid],
    ) -> Result<Arc<dyn GattDevice>, ClientError>;

    /// Aborts a pending `request_device`, which then fails with
    /// [`ClientError::UserCancelled`].
    fn cancel_request(&self) {}
}

/// A selected peripheral and its GATT server
#[async_trait::async_trait]
pub trait GattDevice: Send + Sync {
    fn id(&self) -> String;
    fn name(&self) -> String;
    async fn connect(&self) -> Result<(), ClientError>;
    async fn disconnect(&self) -> Result<(), ClientError>;
    async fn is_connected(&self) -> bool;
    async fn primary_services(&self) -> Result<Vec<Arc<dyn GattService>>, ClientError>;
    /// Resolves once the GATT server reports the link as dropped.
    async fn disconnected(&self) -> Result<(), ClientError>;
}

#[async_trait::async_trait]
pub trait GattService: Send + Sync {
    fn uuid(&self) -> Uuid;
    async fn characteristics(&self) -> Result<Vec<Arc<dyn GattCharacteristic>>, ClientError>;
}

#[async_trait::async_trait]
pub trait GattCharacteristic: Send + Sync {
    fn uuid(&self) -> Uuid;
    async fn read_value(&self) -> Result<Vec<u8>, ClientError>;
    /// Reads the descriptor `descriptor` of this characteristic.
    async fn read_descriptor(&self, descriptor: Uuid) -> Result<Vec<u8>, ClientError>;
    /// Enables notifications. Registration happens once per call.
    async fn notifications(&self) -> Result<NotificationStream<'_>, ClientError>;
}
