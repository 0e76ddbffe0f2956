//! OSC message encoding (OSC 1.0 subset)
//!
//! A message is the address string, the type-tag string and one 4-byte
//! big-endian argument. The wire layout is produced by `rosc`.

use rosc::{encoder, OscPacket, OscType};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while encoding an OSC message
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OscError {
    #[error("OSC address must not be empty")]
    EmptyAddress,
    #[error("OSC encoding failed: {0}")]
    Encode(String),
}

/// The single argument carried by every message this crate sends
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OscArg {
    /// 32-bit two's-complement integer (`i`)
    Int(i32),
    /// 32-bit IEEE-754 float (`f`)
    Float(f32),
}

impl OscArg {
    /// Truncate a decimal toward zero into an integer argument
    ///
    /// Values outside the i32 range saturate.
    pub fn int_from_decimal(value: Decimal) -> Self {
        let truncated = value.trunc();
        let int = truncated.to_i32().unwrap_or(if truncated.is_sign_negative() {
            i32::MIN
        } else {
            i32::MAX
        });
        OscArg::Int(int)
    }

    /// Narrow a decimal into a float argument
    pub fn float_from_decimal(value: Decimal) -> Self {
        OscArg::Float(value.to_f32().unwrap_or_default())
    }

    /// OSC type tag character
    pub fn type_tag(&self) -> char {
        match self {
            OscArg::Int(_) => 'i',
            OscArg::Float(_) => 'f',
        }
    }
}

impl std::fmt::Display for OscArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OscArg::Int(v) => write!(f, "{}{}", v, self.type_tag()),
            OscArg::Float(v) => write!(f, "{}{}", v, self.type_tag()),
        }
    }
}

/// One OSC message with a single argument
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub arg: OscArg,
}

impl OscMessage {
    pub fn new(address: impl Into<String>, arg: OscArg) -> Self {
        Self {
            address: address.into(),
            arg,
        }
    }

    pub fn int(address: impl Into<String>, value: i32) -> Self {
        Self::new(address, OscArg::Int(value))
    }

    pub fn float(address: impl Into<String>, value: f32) -> Self {
        Self::new(address, OscArg::Float(value))
    }

    /// Encode into the OSC binary wire format
    pub fn encode(&self) -> Result<Vec<u8>, OscError> {
        if self.address.is_empty() {
            return Err(OscError::EmptyAddress);
        }

        let arg = match self.arg {
            OscArg::Int(v) => OscType::Int(v),
            OscArg::Float(v) => OscType::Float(v),
        };
        let packet = OscPacket::Message(rosc::OscMessage {
            addr: self.address.clone(),
            args: vec![arg],
        });

        encoder::encode(&packet).map_err(|e| OscError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> rosc::OscMessage {
        match rosc::decoder::decode_udp(bytes).unwrap().1 {
            OscPacket::Message(msg) => msg,
            OscPacket::Bundle(_) => panic!("expected a message, got a bundle"),
        }
    }

    #[test]
    fn test_int_message_layout() {
        let bytes = OscMessage::int("/t", 5).encode().unwrap();

        assert_eq!(
            bytes.as_slice(),
            &[
                b'/', b't', 0, 0, // address
                b',', b'i', 0, 0, // type tags
                0, 0, 0, 5, // argument
            ]
        );
    }

    #[test]
    fn test_address_on_word_boundary_gets_full_pad() {
        let bytes = OscMessage::int("/abc", 1).encode().unwrap();

        // 4 chars + 4 NULs, then tags and argument
        assert_eq!(bytes.len(), 8 + 4 + 4);
        assert_eq!(&bytes[..8], b"/abc\0\0\0\0");
    }

    #[test]
    fn test_int_round_trip_through_independent_decoder() {
        let bytes = OscMessage::int("/t", 5).encode().unwrap();
        let msg = decode(&bytes);

        assert_eq!(msg.addr, "/t");
        assert_eq!(msg.args, vec![OscType::Int(5)]);
    }

    #[test]
    fn test_float_round_trip_through_independent_decoder() {
        let bytes = OscMessage::float("/test/subtest", 0.75).encode().unwrap();
        let msg = decode(&bytes);

        assert_eq!(msg.addr, "/test/subtest");
        assert_eq!(msg.args, vec![OscType::Float(0.75)]);
    }

    #[test]
    fn test_negative_int_is_twos_complement() {
        let bytes = OscMessage::int("/n", -2).encode().unwrap();
        assert_eq!(&bytes[bytes.len() - 4..], &[0xFF, 0xFF, 0xFF, 0xFE]);
    }

    #[test]
    fn test_float_layout_matches_type_tag() {
        let msg = OscMessage::float("/f", 1.0);
        let bytes = msg.encode().unwrap();

        assert_eq!(bytes[5], msg.arg.type_tag() as u8);
        assert_eq!(&bytes[8..], &1.0f32.to_be_bytes());
        assert_eq!(msg.arg.to_string(), "1f");
    }

    #[test]
    fn test_empty_address_is_rejected() {
        assert_eq!(
            OscMessage::int("", 1).encode().unwrap_err(),
            OscError::EmptyAddress
        );
    }

    #[test]
    fn test_decimal_conversions() {
        assert_eq!(OscArg::int_from_decimal(Decimal::new(27, 1)), OscArg::Int(2));
        assert_eq!(OscArg::int_from_decimal(Decimal::new(-27, 1)), OscArg::Int(-2));
        assert_eq!(
            OscArg::int_from_decimal(Decimal::from(10_000_000_000i64)),
            OscArg::Int(i32::MAX)
        );
        assert_eq!(
            OscArg::float_from_decimal(Decimal::new(5, 1)),
            OscArg::Float(0.5)
        );
    }
}
