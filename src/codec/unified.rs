//! Unified lighting structure (16 bytes), shared by the keyboard and the back
//! logo. Byte 0 selects the target; the layout of bytes 3..15 depends on the
//! mode.
//!
//! ```text
//! [0] group  [1] mode  [2] brightness  [15] flags (bit 0 = enable)
//! static:  [3..15]  zone 1..4 RGB
//! effect:  [3] speed  [4] direction  [5..8] RGB
//! ```

use super::{
    MethodCall, MethodId, Rgb, check_brightness, check_range, check_response, decode_brightness,
};
use crate::error::{Error, Result};
use std::fmt;

pub const LEN: usize = 16;
pub const MAX_SPEED: u8 = 9;

const FLAG_ENABLE: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Group {
    Keyboard = 1,
    Logo = 2,
}

impl Group {
    fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Group::Keyboard),
            2 => Some(Group::Logo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LightingMode {
    Static = 0,
    Breathing = 1,
    Neon = 2,
    Wave = 3,
    Shifting = 4,
    Zoom = 5,
    Meteor = 6,
    Twinkling = 7,
}

impl LightingMode {
    pub const ALL: [LightingMode; 8] = [
        LightingMode::Static,
        LightingMode::Breathing,
        LightingMode::Neon,
        LightingMode::Wave,
        LightingMode::Shifting,
        LightingMode::Zoom,
        LightingMode::Meteor,
        LightingMode::Twinkling,
    ];

    pub fn from_u8(v: u8) -> Option<Self> {
        Self::ALL.get(usize::from(v)).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            LightingMode::Static => "static",
            LightingMode::Breathing => "breathing",
            LightingMode::Neon => "neon",
            LightingMode::Wave => "wave",
            LightingMode::Shifting => "shifting",
            LightingMode::Zoom => "zoom",
            LightingMode::Meteor => "meteor",
            LightingMode::Twinkling => "twinkling",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for LightingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    RightToLeft = 1,
    LeftToRight = 2,
}

impl Direction {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Direction::RightToLeft),
            2 => Some(Direction::LeftToRight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Static {
        zones: [Rgb; 4],
    },
    /// Any mode other than `Static`.
    Effect {
        mode: LightingMode,
        speed: u8,
        direction: Direction,
        color: Rgb,
    },
}

impl Pattern {
    pub fn mode(&self) -> LightingMode {
        match self {
            Pattern::Static { .. } => LightingMode::Static,
            Pattern::Effect { mode, .. } => *mode,
        }
    }

    /// Zone 1 for static patterns, the effect color otherwise.
    pub fn primary_color(&self) -> Rgb {
        match self {
            Pattern::Static { zones } => zones[0],
            Pattern::Effect { color, .. } => *color,
        }
    }
}

/// Decoded unified lighting structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lighting {
    pub group: Group,
    pub brightness: u8,
    pub enabled: bool,
    pub pattern: Pattern,
}

impl Lighting {
    pub fn keyboard(brightness: u8, pattern: Pattern) -> Self {
        Self {
            group: Group::Keyboard,
            brightness,
            enabled: true,
            pattern,
        }
    }
}

pub fn encode(lighting: &Lighting) -> Result<[u8; LEN]> {
    let mut buf = [0u8; LEN];
    buf[0] = lighting.group as u8;
    buf[1] = lighting.pattern.mode() as u8;
    buf[2] = check_brightness(lighting.brightness)?;
    match lighting.pattern {
        Pattern::Static { zones } => {
            for (i, zone) in zones.iter().enumerate() {
                buf[3 + i * 3..6 + i * 3].copy_from_slice(&zone.to_bytes());
            }
        }
        Pattern::Effect {
            mode,
            speed,
            direction,
            color,
        } => {
            if mode == LightingMode::Static {
                return Err(Error::OutOfRange {
                    field: "effect mode",
                    value: 0,
                    min: 1,
                    max: LightingMode::Twinkling as i64,
                });
            }
            check_range("speed", i64::from(speed), 0, i64::from(MAX_SPEED))?;
            buf[3] = speed;
            buf[4] = direction as u8;
            buf[5..8].copy_from_slice(&color.to_bytes());
        }
    }
    if lighting.enabled {
        buf[15] |= FLAG_ENABLE;
    }
    Ok(buf)
}

pub fn set_call(lighting: &Lighting) -> Result<MethodCall> {
    Ok(MethodCall::new(
        MethodId::SetLighting,
        encode(lighting)?.to_vec(),
    ))
}

pub fn get_call(group: Group) -> MethodCall {
    MethodCall::new(MethodId::GetLighting, vec![group as u8])
}

/// Decode a full `GetLighting` response.
pub fn decode(response: &[u8]) -> Result<Lighting> {
    let body = check_response(MethodId::GetLighting, response)?;
    decode_body(body)
}

/// Decode the 16-byte structure itself.
pub fn decode_body(buf: &[u8]) -> Result<Lighting> {
    let method = MethodId::GetLighting;
    if buf.len() != LEN {
        return Err(Error::protocol(
            method.id(),
            format!("lighting structure must be {} bytes, got {}", LEN, buf.len()),
        ));
    }
    let group = Group::from_u8(buf[0])
        .ok_or_else(|| Error::protocol(method.id(), format!("unknown group {}", buf[0])))?;
    let mode = LightingMode::from_u8(buf[1])
        .ok_or_else(|| Error::protocol(method.id(), format!("unknown mode {}", buf[1])))?;
    let brightness = decode_brightness(method, buf[2])?;

    let pattern = match mode {
        LightingMode::Static => {
            let mut zones = [Rgb::BLACK; 4];
            for (i, zone) in zones.iter_mut().enumerate() {
                *zone = Rgb::from_bytes(&buf[3 + i * 3..6 + i * 3]);
            }
            Pattern::Static { zones }
        }
        mode => {
            if buf[3] > MAX_SPEED {
                return Err(Error::protocol(
                    method.id(),
                    format!("speed {} exceeds {}", buf[3], MAX_SPEED),
                ));
            }
            let direction = Direction::from_u8(buf[4]).ok_or_else(|| {
                Error::protocol(method.id(), format!("unknown direction {}", buf[4]))
            })?;
            Pattern::Effect {
                mode,
                speed: buf[3],
                direction,
                color: Rgb::from_bytes(&buf[5..8]),
            }
        }
    };

    Ok(Lighting {
        group,
        brightness,
        enabled: buf[15] & FLAG_ENABLE != 0,
        pattern,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(r: u8, g: u8, b: u8) -> Rgb {
        Rgb::new(r, g, b)
    }

    #[test]
    fn test_static_layout() {
        let lighting = Lighting::keyboard(
            60,
            Pattern::Static {
                zones: [
                    rgb(255, 0, 0),
                    rgb(0, 255, 0),
                    rgb(0, 0, 255),
                    rgb(255, 255, 255),
                ],
            },
        );
        let buf = encode(&lighting).unwrap();
        assert_eq!(
            buf,
            [1, 0, 60, 255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255, 1]
        );
    }

    #[test]
    fn test_effect_layout() {
        let lighting = Lighting::keyboard(
            80,
            Pattern::Effect {
                mode: LightingMode::Wave,
                speed: 3,
                direction: Direction::LeftToRight,
                color: rgb(0x12, 0x34, 0x56),
            },
        );
        let buf = encode(&lighting).unwrap();
        assert_eq!(buf[..8], [1, 3, 80, 3, 2, 0x12, 0x34, 0x56]);
        assert_eq!(buf[8..15], [0; 7]);
        assert_eq!(buf[15], 1);
    }

    #[test]
    fn test_logo_disabled_clears_flag() {
        let lighting = Lighting {
            group: Group::Logo,
            brightness: 0,
            enabled: false,
            pattern: Pattern::Static {
                zones: [Rgb::BLACK; 4],
            },
        };
        let buf = encode(&lighting).unwrap();
        assert_eq!(buf[0], 2);
        assert_eq!(buf[15], 0);
        assert_eq!(decode_body(&buf).unwrap(), lighting);
    }

    #[test]
    fn test_rejects_out_of_range_before_encoding() {
        let bright = Lighting::keyboard(101, Pattern::Static { zones: [Rgb::BLACK; 4] });
        assert!(matches!(
            encode(&bright),
            Err(Error::OutOfRange { field: "brightness", .. })
        ));

        let fast = Lighting::keyboard(
            50,
            Pattern::Effect {
                mode: LightingMode::Neon,
                speed: 10,
                direction: Direction::RightToLeft,
                color: Rgb::BLACK,
            },
        );
        assert!(matches!(
            encode(&fast),
            Err(Error::OutOfRange { field: "speed", .. })
        ));

        let static_as_effect = Lighting::keyboard(
            50,
            Pattern::Effect {
                mode: LightingMode::Static,
                speed: 1,
                direction: Direction::RightToLeft,
                color: Rgb::BLACK,
            },
        );
        assert!(encode(&static_as_effect).is_err());
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let mut buf = [0u8; LEN];
        buf[0] = 9;
        assert!(matches!(decode_body(&buf), Err(Error::Protocol { .. })));

        buf[0] = 1;
        buf[1] = 8;
        assert!(decode_body(&buf).is_err());

        buf[1] = 1;
        buf[4] = 3;
        assert!(decode_body(&buf).is_err());

        buf[4] = 1;
        buf[2] = 150;
        assert!(decode_body(&buf).is_err());
    }

    #[test]
    fn test_decode_checks_status_and_length() {
        let mut response = vec![0u8; LEN + 1];
        response[1] = 1;
        assert!(decode(&response).is_ok());

        response[0] = 0x05;
        assert!(matches!(
            decode(&response),
            Err(Error::Firmware { status: 5, .. })
        ));

        assert!(matches!(
            decode(&[0u8; LEN - 1]),
            Err(Error::Protocol { .. })
        ));
    }

    #[test]
    fn test_mode_names() {
        for mode in LightingMode::ALL {
            assert_eq!(LightingMode::from_name(mode.name()), Some(mode));
            assert_eq!(LightingMode::from_u8(mode as u8), Some(mode));
        }
        assert_eq!(LightingMode::from_name("WAVE"), Some(LightingMode::Wave));
        assert_eq!(LightingMode::from_name("disco"), None);
    }
}
