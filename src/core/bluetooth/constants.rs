//! Constants used throughout the application
//! This module contains all the constant values used in the application,
//! such as UUIDs, timeouts, and descriptor layout sizes.

use uuid::Uuid;

/// The advertised name of the SmartGlove
pub const DEVICE_NAME: &str = "SmartGlove";

/// The Bluetooth base UUID that 16 and 32-bit short forms are expanded onto
pub const BLUETOOTH_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805f9b34fb;

/// Expands a 16-bit assigned number into its full 128-bit UUID.
pub const fn uuid_from_u16(short: u16) -> Uuid {
    uuid_from_u32(short as u32)
}

/// Expands a 32-bit assigned number into its full 128-bit UUID.
pub const fn uuid_from_u32(short: u32) -> Uuid {
    Uuid::from_u128(((short as u128) << 96) | BLUETOOTH_BASE_UUID)
}

/// Standard Bluetooth Service UUIDs
pub const UUID_ENVIRONMENTAL_SENSING_SERVICE: Uuid = uuid_from_u16(0x181A);
pub const UUID_SPECTRAL_SENSOR_SERVICE: Uuid = uuid_from_u16(0x054D);

/// SmartGlove vendor Service UUIDs
pub const UUID_MAGNETIC_FIELD_SERVICE: Uuid =
    Uuid::from_u128(0x7749eb1b_2b16_4d32_8422_e792dae7adb8);
pub const UUID_IMU_SERVICE: Uuid = Uuid::from_u128(0x606a0692_1e69_422a_9f73_de87d239aade);

/// Standard Bluetooth Characteristic UUIDs
pub const UUID_PRESSURE: Uuid = uuid_from_u16(0x2A6D);
pub const UUID_TEMPERATURE: Uuid = uuid_from_u16(0x2A6E);
pub const UUID_HUMIDITY: Uuid = uuid_from_u16(0x2A6F);
pub const UUID_CO2_CONCENTRATION: Uuid = uuid_from_u16(0x2B8C);
pub const UUID_BVOC_CONCENTRATION: Uuid = uuid_from_u16(0x2BE7);

/// SmartGlove vendor Characteristic UUIDs
pub const UUID_IAQ: Uuid = Uuid::from_u128(0xb52338a6_b7fa_47d9_8db4_dbb86ac6b05c);
pub const UUID_STATIC_IAQ: Uuid = Uuid::from_u128(0x0d1ab684_14a4_479b_9dcd_86b6fc2e99fa);

/// Characteristic User Description descriptor
pub const UUID_USER_DESCRIPTION_DESCRIPTOR: Uuid = uuid_from_u16(0x2901);

/// Characteristic Presentation Format descriptor
pub const UUID_PRESENTATION_FORMAT_DESCRIPTOR: Uuid = uuid_from_u16(0x2904);

/// Minimum length of a Characteristic Presentation Format descriptor in bytes
pub const MIN_PRESENTATION_DESCRIPTOR_LEN: usize = 7;

/// Upper bound on the number of decimals rendered for a numeric value
pub const MAX_DECIMAL_PLACES: usize = 100;

/// Default time allowed for finding the device, in seconds
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 30;

/// Default timeout for GATT connect and service enumeration, in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default timeout for descriptor and characteristic reads, in seconds
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 5;

/// Parses a UUID in any of the textual forms used by Bluetooth tooling:
/// `0x181A`, `181A`, `0000181a`, or the full hyphenated form.
pub fn canonical_uuid(text: &str) -> Option<Uuid> {
    let trimmed = text.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    match hex.len() {
        4 => u16::from_str_radix(hex, 16).ok().map(uuid_from_u16),
        8 => u32::from_str_radix(hex, 16).ok().map(uuid_from_u32),
        _ => Uuid::parse_str(hex).ok(),
    }
}
