//! Characteristic Presentation Format descriptor parsing
//! Layout follows Bluetooth Assigned Numbers §2.4.1: format, exponent, unit,
//! namespace and description, all little-endian.

use serde::Serialize;

use crate::core::bluetooth::constants::MIN_PRESENTATION_DESCRIPTOR_LEN;
use crate::error::ClientError;

/// Format codes a characteristic value can be encoded with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormatCode {
    Boolean,
    UInt8,
    UInt16,
    UInt32,
    SInt8,
    SInt16,
    SInt32,
    Float32,
    /// Any code this client cannot decode
    Unsupported(u8),
}

impl FormatCode {
    pub fn from_byte(code: u8) -> Self {
        match code {
            0x01 => Self::Boolean,
            0x04 => Self::UInt8,
            0x06 => Self::UInt16,
            0x08 => Self::UInt32,
            0x0C => Self::SInt8,
            0x0E => Self::SInt16,
            0x10 => Self::SInt32,
            0x14 => Self::Float32,
            other => Self::Unsupported(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Self::Boolean => 0x01,
            Self::UInt8 => 0x04,
            Self::UInt16 => 0x06,
            Self::UInt32 => 0x08,
            Self::SInt8 => 0x0C,
            Self::SInt16 => 0x0E,
            Self::SInt32 => 0x10,
            Self::Float32 => 0x14,
            Self::Unsupported(code) => code,
        }
    }

    /// Width of the encoded value in bytes, `None` when unsupported.
    pub fn width(self) -> Option<usize> {
        match self {
            Self::Boolean | Self::UInt8 | Self::SInt8 => Some(1),
            Self::UInt16 | Self::SInt16 => Some(2),
            Self::UInt32 | Self::SInt32 | Self::Float32 => Some(4),
            Self::Unsupported(_) => None,
        }
    }
}

/// Decoded presentation format of one characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PresentationInfo {
    pub format: FormatCode,
    /// Base-10 scaling exponent applied to the raw value
    pub exponent: i8,
    /// Bluetooth unit assigned number, e.g. 0x272F for degrees Celsius
    pub unit: u16,
    pub namespace: u8,
    pub description: u16,
}

impl PresentationInfo {
    pub const fn new(format: FormatCode, exponent: i8, unit: u16) -> Self {
        Self {
            format,
            exponent,
            unit,
            namespace: 0,
            description: 0,
        }
    }

    /// Parses a raw descriptor value. Only the first seven bytes are read.
    pub fn parse(bytes: &[u8]) -> Result<Self, ClientError> {
        if bytes.len() < MIN_PRESENTATION_DESCRIPTOR_LEN {
            return Err(ClientError::InvalidDescriptor { len: bytes.len() });
        }

        Ok(Self {
            format: FormatCode::from_byte(bytes[0]),
            exponent: bytes[1] as i8,
            unit: u16::from_le_bytes([bytes[2], bytes[3]]),
            namespace: bytes[4],
            description: u16::from_le_bytes([bytes[5], bytes[6]]),
        })
    }

    /// Encodes back into the seven byte descriptor layout.
    pub fn to_bytes(&self) -> [u8; MIN_PRESENTATION_DESCRIPTOR_LEN] {
        let unit = self.unit.to_le_bytes();
        let description = self.description.to_le_bytes();
        [
            self.format.to_byte(),
            self.exponent as u8,
            unit[0],
            unit[1],
            self.namespace,
            description[0],
            description[1],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sint16_centi_unitless() {
        let info = PresentationInfo::parse(&[0x0E, 0xFE, 0x00, 0x27, 0, 0, 0]).unwrap();
        assert_eq!(info.format, FormatCode::SInt16);
        assert_eq!(info.exponent, -2);
        assert_eq!(info.unit, 0x2700);
    }

    #[test]
    fn test_parse_rejects_short_buffers() {
        for len in 0..MIN_PRESENTATION_DESCRIPTOR_LEN {
            let bytes = vec![0x04; len];
            assert_eq!(
                PresentationInfo::parse(&bytes),
                Err(ClientError::InvalidDescriptor { len })
            );
        }
    }

    #[test]
    fn test_parse_ignores_trailing_bytes() {
        let info = PresentationInfo::parse(&[0x06, 0x01, 0x2F, 0x27, 0x01, 0x00, 0x00, 0xAA, 0xBB])
            .unwrap();
        assert_eq!(info.format, FormatCode::UInt16);
        assert_eq!(info.exponent, 1);
        assert_eq!(info.unit, 0x272F);
        assert_eq!(info.namespace, 1);
    }

    #[test]
    fn test_descriptor_round_trip() {
        let samples: [[u8; 7]; 4] = [
            [0x0E, 0xFE, 0x00, 0x27, 0x01, 0x00, 0x00],
            [0x01, 0x00, 0x00, 0x27, 0x00, 0x00, 0x00],
            [0x08, 0xFF, 0x24, 0x27, 0x01, 0x34, 0x12],
            [0x1B, 0x7F, 0x99, 0x99, 0x00, 0xFF, 0xFF],
        ];
        for bytes in samples {
            let info = PresentationInfo::parse(&bytes).unwrap();
            assert_eq!(info.to_bytes(), bytes);
        }
    }

    #[test]
    fn test_unknown_format_code_is_preserved() {
        assert_eq!(FormatCode::from_byte(0x1B), FormatCode::Unsupported(0x1B));
        assert_eq!(FormatCode::Unsupported(0x1B).to_byte(), 0x1B);
        assert_eq!(FormatCode::Unsupported(0x1B).width(), None);
    }
}
