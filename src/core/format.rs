//! Display formatting for decoded values.

use crate::core::bluetooth::constants::MAX_DECIMAL_PLACES;
use crate::core::presentation::PresentationInfo;
use crate::core::value::DecodedValue;

/// Bluetooth unit assigned numbers (Assigned Numbers §3.5) and their symbols
pub const UNIT_TABLE: &[(u16, &str)] = &[
    (0x2700, ""),
    (0x2724, "Pa"),
    (0x2728, "V"),
    (0x272F, "°C"),
    (0x27AD, "%"),
    (0x27C4, "ppm"),
    (0x27C5, "ppb"),
];

/// Looks up the display symbol for a unit code.
pub fn unit_symbol(unit: u16) -> Option<&'static str> {
    UNIT_TABLE
        .iter()
        .find(|(code, _)| *code == unit)
        .map(|(_, symbol)| *symbol)
}

/// Number of decimals shown for a given exponent, clamped to `[0, 100]`.
pub fn decimal_places(exponent: i8) -> usize {
    (-(exponent as i32)).clamp(0, MAX_DECIMAL_PLACES as i32) as usize
}

/// Renders a value for display.
///
/// Booleans render as `true`/`false` without a unit. Numbers get one decimal
/// per negative power of ten, then a space and the unit symbol (empty when
/// the unit is unitless or unknown).
pub fn format_value(value: &DecodedValue, info: &PresentationInfo) -> String {
    match value {
        DecodedValue::Boolean(b) => b.to_string(),
        DecodedValue::Numeric(v) => {
            let unit = unit_symbol(info.unit).unwrap_or("");
            format!("{:.*} {}", decimal_places(info.exponent), v, unit)
        }
    }
}
