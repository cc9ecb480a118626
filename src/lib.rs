//! SmartGlove client library
//! Discovers the sensors of a SmartGlove over Bluetooth LE, decodes their
//! values from the presentation format descriptors and streams updates.

// Module declarations
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod state;
pub mod utils;

pub use error::ClientError;
