//! Bluetooth functionality for the SmartGlove client
//! This module handles all bluetooth operations including device acquisition,
//! connecting, service discovery and receiving notifications from the glove.

mod connection;
pub mod constants;
mod device;
mod discovery;
mod notification;
mod platform;
mod scanner;
mod session;
pub mod tables;
mod types;

// Re-export types that should be publicly accessible
pub use connection::{
    ConnectionManager, CONNECT_FAILED_MESSAGE, DISCONNECTED_MESSAGE, UNSUPPORTED_MESSAGE,
};
pub use device::{BluestCharacteristic, BluestDevice, BluestService};
pub use discovery::init_services;
pub use notification::{handle_notification, CharacteristicTracker};
pub use platform::{BlePlatform, GattCharacteristic, GattDevice, GattService, NotificationStream};
pub use scanner::{extract_mac_address, BluestPlatform};
pub use session::{PresentationCache, Session, SessionContext};
pub use types::{ConnectOutcome, ConnectionStatus};
