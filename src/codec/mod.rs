//! Byte-exact encoding of firmware method calls.
//!
//! Every response starts with a status byte (`0` is success) followed by the
//! method's body. Payload and response lengths are fixed per method id.

pub mod dedicated;
pub mod fan;
pub mod setting;
pub mod unified;

use crate::error::{Error, Result};
use std::fmt;

/// Methods exposed by the gaming WMI dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MethodId {
    SetLogo = 12,
    GetLogo = 13,
    SetFan = 14,
    GetFan = 15,
    SetLighting = 20,
    GetLighting = 21,
    SetMisc = 22,
    GetMisc = 23,
    SetBatteryHealth = 24,
    GetBatteryHealth = 25,
}

impl MethodId {
    pub const ALL: [MethodId; 10] = [
        MethodId::SetLogo,
        MethodId::GetLogo,
        MethodId::SetFan,
        MethodId::GetFan,
        MethodId::SetLighting,
        MethodId::GetLighting,
        MethodId::SetMisc,
        MethodId::GetMisc,
        MethodId::SetBatteryHealth,
        MethodId::GetBatteryHealth,
    ];

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.id() == id)
    }

    pub fn payload_len(self) -> usize {
        match self {
            MethodId::SetLighting => unified::LEN,
            MethodId::GetLighting => 1,
            MethodId::SetLogo => dedicated::LEN,
            MethodId::GetLogo => 1,
            MethodId::SetFan => fan::LEN,
            MethodId::GetFan => 1,
            MethodId::SetMisc => 2,
            MethodId::GetMisc => 1,
            MethodId::SetBatteryHealth => 3,
            MethodId::GetBatteryHealth => 2,
        }
    }

    /// Status byte plus body.
    pub fn response_len(self) -> usize {
        1 + match self {
            MethodId::GetLighting => unified::LEN,
            MethodId::GetLogo => dedicated::LEN,
            MethodId::GetFan => fan::LEN - 1,
            MethodId::GetMisc | MethodId::GetBatteryHealth => 1,
            MethodId::SetLighting
            | MethodId::SetLogo
            | MethodId::SetFan
            | MethodId::SetMisc
            | MethodId::SetBatteryHealth => 0,
        }
    }

    pub fn is_set(self) -> bool {
        matches!(
            self,
            MethodId::SetLighting
                | MethodId::SetLogo
                | MethodId::SetFan
                | MethodId::SetMisc
                | MethodId::SetBatteryHealth
        )
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.id())
    }
}

/// A fully encoded call, ready for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: MethodId,
    pub payload: Vec<u8>,
    pub expected_response_len: usize,
}

impl MethodCall {
    /// Panics if `payload` does not have the method's exact length: lengths
    /// are static per method, so a mismatch is a bug in an encoder.
    pub fn new(method: MethodId, payload: Vec<u8>) -> Self {
        assert_eq!(
            payload.len(),
            method.payload_len(),
            "payload length for {} must be {}",
            method,
            method.payload_len()
        );
        Self {
            method,
            payload,
            expected_response_len: method.response_len(),
        }
    }
}

/// Validate a raw response buffer and return its body. A non-zero status
/// byte is a firmware failure whatever the length of the rest.
pub fn check_response(method: MethodId, buf: &[u8]) -> Result<&[u8]> {
    check_status(method, buf)?;
    if buf.len() != method.response_len() {
        return Err(Error::protocol(
            method.id(),
            format!(
                "expected {} response bytes, got {}",
                method.response_len(),
                buf.len()
            ),
        ));
    }
    Ok(&buf[1..])
}

pub(crate) fn check_status(method: MethodId, buf: &[u8]) -> Result<()> {
    match buf.first() {
        Some(&status) if status != 0 => Err(Error::Firmware {
            method: method.id(),
            status: u32::from(status),
        }),
        _ => Ok(()),
    }
}

/// Render a buffer the way it is logged and reported.
pub fn hex(buf: &[u8]) -> String {
    buf.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `RRGGBB` or `#RRGGBB`.
    pub fn parse_hex(s: &str) -> Result<Self> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::format(s, "expected color as RRGGBB"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| Error::format(s, "expected color as RRGGBB"))
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    fn from_bytes(b: &[u8]) -> Self {
        Self::new(b[0], b[1], b[2])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// State of the back logo, shared by the unified and dedicated paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoState {
    pub color: Rgb,
    pub brightness: u8,
    pub enabled: bool,
}

pub const MAX_BRIGHTNESS: u8 = 100;

pub(crate) fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<()> {
    if value < min || value > max {
        return Err(Error::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

pub(crate) fn check_brightness(brightness: u8) -> Result<u8> {
    check_range(
        "brightness",
        i64::from(brightness),
        0,
        i64::from(MAX_BRIGHTNESS),
    )?;
    Ok(brightness)
}

pub(crate) fn decode_bool(method: MethodId, field: &str, byte: u8) -> Result<bool> {
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::protocol(
            method.id(),
            format!("{} byte must be 0 or 1, got {}", field, other),
        )),
    }
}

pub(crate) fn decode_brightness(method: MethodId, byte: u8) -> Result<u8> {
    if byte > MAX_BRIGHTNESS {
        return Err(Error::protocol(
            method.id(),
            format!("brightness {} exceeds {}", byte, MAX_BRIGHTNESS),
        ));
    }
    Ok(byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_lengths_are_consistent() {
        for method in MethodId::ALL {
            assert_eq!(MethodId::from_id(method.id()), Some(method));
            if method.is_set() {
                assert_eq!(method.response_len(), 1, "{}", method);
            } else {
                assert!(method.response_len() > 1, "{}", method);
            }
        }
    }

    #[test]
    #[should_panic(expected = "payload length")]
    fn test_wrong_payload_length_panics() {
        MethodCall::new(MethodId::SetLogo, vec![0; 5]);
    }

    #[test]
    fn test_check_response() {
        assert_eq!(check_response(MethodId::GetMisc, &[0, 4]).unwrap(), &[4]);
        assert!(matches!(
            check_response(MethodId::GetMisc, &[3, 4]),
            Err(Error::Firmware { method: 23, status: 3 })
        ));
        assert!(matches!(
            check_response(MethodId::GetMisc, &[0]),
            Err(Error::Protocol { method: 23, .. })
        ));
        assert!(matches!(
            check_response(MethodId::SetMisc, &[]),
            Err(Error::Protocol { .. })
        ));
    }

    #[test]
    fn test_status_only_failure_on_get_is_firmware_error() {
        assert!(matches!(
            check_response(MethodId::GetLighting, &[0x05]),
            Err(Error::Firmware { method: 21, status: 5 })
        ));
        assert!(matches!(
            check_response(MethodId::GetLighting, &[0x00]),
            Err(Error::Protocol { method: 21, .. })
        ));
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(Rgb::parse_hex("ff8000").unwrap(), Rgb::new(255, 128, 0));
        assert_eq!(Rgb::parse_hex("#00FF7f").unwrap(), Rgb::new(0, 255, 127));
        assert!(matches!(Rgb::parse_hex("GGGGGG"), Err(Error::Format { .. })));
        assert!(Rgb::parse_hex("fff").is_err());
        assert!(Rgb::parse_hex("ff00000").is_err());
        assert!(Rgb::parse_hex("").is_err());
    }

    #[test]
    fn test_color_display_is_lowercase() {
        assert_eq!(Rgb::new(0xAB, 0x0C, 0xFF).to_string(), "ab0cff");
    }

    #[test]
    fn test_hex_dump() {
        assert_eq!(hex(&[0, 0x1f, 0xff]), "00 1f ff");
    }

    #[test]
    fn test_brightness_range() {
        assert_eq!(check_brightness(100).unwrap(), 100);
        assert!(matches!(
            check_brightness(101),
            Err(Error::OutOfRange {
                field: "brightness",
                value: 101,
                ..
            })
        ));
    }
}
