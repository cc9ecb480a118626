//! Static lookup tables for the services and characteristics this client understands.

use uuid::Uuid;

use crate::core::bluetooth::constants::{
    UUID_BVOC_CONCENTRATION, UUID_CO2_CONCENTRATION, UUID_ENVIRONMENTAL_SENSING_SERVICE,
    UUID_HUMIDITY, UUID_IAQ, UUID_IMU_SERVICE, UUID_MAGNETIC_FIELD_SERVICE, UUID_PRESSURE,
    UUID_SPECTRAL_SENSOR_SERVICE, UUID_STATIC_IAQ, UUID_TEMPERATURE,
};

/// Services published by the SmartGlove firmware
pub const SUPPORTED_SERVICES: &[(Uuid, &str)] = &[
    (UUID_ENVIRONMENTAL_SENSING_SERVICE, "Environmental Sensor"),
    (UUID_SPECTRAL_SENSOR_SERVICE, "Spectral Light Sensor"),
    (UUID_MAGNETIC_FIELD_SERVICE, "Magnetic Field Sensor"),
    (UUID_IMU_SERVICE, "Inertial Measurement Unit"),
];

/// Characteristics recognised by the allow-list discovery mode
pub const SUPPORTED_CHARACTERISTICS: &[(Uuid, &str)] = &[
    (UUID_PRESSURE, "Pressure"),
    (UUID_TEMPERATURE, "Temperature"),
    (UUID_HUMIDITY, "Humidity"),
    (UUID_IAQ, "Index of air quality (IAQ)"),
    (UUID_STATIC_IAQ, "Static index of air quality (SIAQ)"),
    (UUID_CO2_CONCENTRATION, "CO2 concentration"),
    (UUID_BVOC_CONCENTRATION, "Breath VOC concentration"),
];

/// Returns the display name of a supported service.
pub fn service_name(uuid: &Uuid) -> Option<&'static str> {
    lookup(SUPPORTED_SERVICES, uuid)
}

/// Returns the display name of a characteristic in the allow-list.
pub fn characteristic_name(uuid: &Uuid) -> Option<&'static str> {
    lookup(SUPPORTED_CHARACTERISTICS, uuid)
}

/// The service UUIDs the platform should be asked to expose.
pub fn supported_service_uuids() -> Vec<Uuid> {
    SUPPORTED_SERVICES.iter().map(|(uuid, _)| *uuid).collect()
}

fn lookup(table: &'static [(Uuid, &'static str)], uuid: &Uuid) -> Option<&'static str> {
    table
        .iter()
        .find(|(candidate, _)| candidate == uuid)
        .map(|(_, name)| *name)
}
