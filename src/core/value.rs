//! Characteristic value decoding
//! Turns raw little-endian payloads into scaled physical quantities.

use serde::Serialize;

use crate::core::presentation::{FormatCode, PresentationInfo};
use crate::error::ClientError;

/// A decoded characteristic value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecodedValue {
    Boolean(bool),
    Numeric(f64),
}

/// Decodes `bytes` according to `info`.
///
/// Integer formats are scaled by `10^exponent`; booleans and float32 ignore it.
/// Bytes past the format width are ignored.
pub fn decode_value(info: &PresentationInfo, bytes: &[u8]) -> Result<DecodedValue, ClientError> {
    let width = info
        .format
        .width()
        .ok_or(ClientError::UnsupportedFormat(info.format.to_byte()))?;
    if bytes.len() < width {
        return Err(ClientError::ShortValueBuffer {
            expected: width,
            actual: bytes.len(),
        });
    }

    let raw = match info.format {
        FormatCode::Boolean => return Ok(DecodedValue::Boolean(bytes[0] != 0)),
        FormatCode::UInt8 => bytes[0] as f64,
        FormatCode::UInt16 => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
        FormatCode::UInt32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
        FormatCode::SInt8 => bytes[0] as i8 as f64,
        FormatCode::SInt16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
        FormatCode::SInt32 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
        // a float carries its own magnitude; the exponent only sets the decimals shown
        FormatCode::Float32 => {
            let raw = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            return Ok(DecodedValue::Numeric(raw as f64));
        }
        FormatCode::Unsupported(code) => return Err(ClientError::UnsupportedFormat(code)),
    };

    Ok(DecodedValue::Numeric(scale(raw, info.exponent)))
}

/// Applies a base-10 exponent. Negative exponents divide so that e.g.
/// 1234 with exponent -2 lands on the nearest double to 12.34.
pub fn scale(raw: f64, exponent: i8) -> f64 {
    if exponent < 0 {
        raw / 10f64.powi(-(exponent as i32))
    } else {
        raw * 10f64.powi(exponent as i32)
    }
}

/// Decodes like [`decode_value`] but falls back to `Numeric(0.0)` on failure,
/// returning the error alongside so the caller can report it.
pub fn decode_or_zero(
    info: &PresentationInfo,
    bytes: &[u8],
) -> (DecodedValue, Option<ClientError>) {
    match decode_value(info, bytes) {
        Ok(value) => (value, None),
        Err(e) => (DecodedValue::Numeric(0.0), Some(e)),
    }
}
