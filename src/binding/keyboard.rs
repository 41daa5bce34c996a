//! Keyboard backlight attributes.
//!
//! Both attributes read and write the same unified lighting structure, so
//! each one renders whatever the keyboard is currently doing:
//! `per_zone_mode` shows an effect color in all four zones, and
//! `four_zone_mode` shows a static keyboard as `static,0,<brightness>,1,<zone 1>`.

use super::{Control, brightness, fields, number};
use crate::codec::{MethodId, Rgb};
use crate::codec::unified::{self, Direction, Group, Lighting, LightingMode, Pattern};
use crate::dispatch::{Candidate, Probe};
use crate::error::{Error, Result};
use crate::platform::Feature;

pub const PER_ZONE: &str = "per_zone_mode";
pub const FOUR_ZONE: &str = "four_zone_mode";

/// Four zone colors plus a brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneRequest {
    pub zones: [Rgb; 4],
    pub brightness: u8,
}

/// `mode,speed,brightness,direction,color`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectRequest {
    pub mode: LightingMode,
    pub speed: u8,
    pub brightness: u8,
    pub direction: Direction,
    pub color: Rgb,
}

impl EffectRequest {
    /// A `static` effect is a single color on all four zones.
    pub fn lighting(&self) -> Lighting {
        let pattern = match self.mode {
            LightingMode::Static => Pattern::Static {
                zones: [self.color; 4],
            },
            mode => Pattern::Effect {
                mode,
                speed: self.speed,
                direction: self.direction,
                color: self.color,
            },
        };
        Lighting::keyboard(self.brightness, pattern)
    }
}

fn decode_keyboard(response: &[u8]) -> Result<Lighting> {
    let lighting = unified::decode(response)?;
    if lighting.group != Group::Keyboard {
        return Err(Error::protocol(
            MethodId::GetLighting.id(),
            format!("asked for keyboard lighting, got {:?}", lighting.group),
        ));
    }
    Ok(lighting)
}

/// Mode by name (case-insensitive) or by numeric id.
fn parse_mode(text: &str, field: &str) -> Result<LightingMode> {
    if let Some(mode) = LightingMode::from_name(field) {
        return Ok(mode);
    }
    field
        .parse::<u8>()
        .ok()
        .and_then(LightingMode::from_u8)
        .ok_or_else(|| {
            let names: Vec<&str> = LightingMode::ALL.iter().map(|m| m.name()).collect();
            Error::format(
                text,
                format!("unknown mode {:?}, expected one of {}", field, names.join(", ")),
            )
        })
}

fn keyboard_probe() -> Probe<Lighting> {
    Probe {
        label: "unified",
        call: unified::get_call(Group::Keyboard),
        decode: decode_keyboard,
    }
}

fn keyboard_candidate(lighting: Lighting) -> Result<Vec<Candidate<Lighting>>> {
    Ok(vec![Candidate {
        label: "unified",
        calls: vec![unified::set_call(&lighting)?],
        verify: keyboard_probe(),
        expected: lighting,
    }])
}

#[derive(Debug, Default)]
pub struct PerZone;

impl Control for PerZone {
    type Request = ZoneRequest;
    type State = Lighting;

    const NAME: &'static str = PER_ZONE;
    const FEATURE: Feature = Feature::Keyboard;

    fn parse(&self, text: &str) -> Result<ZoneRequest> {
        let parts = fields(text, 5, "zone1,zone2,zone3,zone4,brightness")?;
        let mut zones = [Rgb::BLACK; 4];
        for (zone, field) in zones.iter_mut().zip(&parts[..4]) {
            *zone = Rgb::parse_hex(field).map_err(|_| {
                Error::format(text, format!("zone color {:?} is not RRGGBB", field))
            })?;
        }
        Ok(ZoneRequest {
            zones,
            brightness: brightness(text, parts[4])?,
        })
    }

    fn format(&self, state: &Lighting) -> String {
        let zones = match state.pattern {
            Pattern::Static { zones } => zones,
            Pattern::Effect { color, .. } => [color; 4],
        };
        format!(
            "{},{},{},{},{}",
            zones[0], zones[1], zones[2], zones[3], state.brightness
        )
    }

    fn probes(&self) -> Vec<Probe<Lighting>> {
        vec![keyboard_probe()]
    }

    fn candidates(&self, request: &ZoneRequest) -> Result<Vec<Candidate<Lighting>>> {
        keyboard_candidate(Lighting::keyboard(
            request.brightness,
            Pattern::Static {
                zones: request.zones,
            },
        ))
    }
}

#[derive(Debug, Default)]
pub struct FourZone;

impl Control for FourZone {
    type Request = EffectRequest;
    type State = Lighting;

    const NAME: &'static str = FOUR_ZONE;
    const FEATURE: Feature = Feature::Keyboard;

    fn parse(&self, text: &str) -> Result<EffectRequest> {
        let parts = fields(text, 5, "mode,speed,brightness,direction,color")?;

        let mode = parse_mode(text, parts[0])?;
        let speed = number(text, parts[1], "speed", 0, i64::from(unified::MAX_SPEED))? as u8;
        let brightness = brightness(text, parts[2])?;
        let direction = Direction::from_u8(number(text, parts[3], "direction", 1, 2)? as u8)
            .ok_or_else(|| Error::format(text, "direction must be 1 or 2"))?;
        let color = Rgb::parse_hex(parts[4])?;

        Ok(EffectRequest {
            mode,
            speed,
            brightness,
            direction,
            color,
        })
    }

    fn format(&self, state: &Lighting) -> String {
        match state.pattern {
            Pattern::Static { zones } => format!(
                "{},0,{},{},{}",
                LightingMode::Static,
                state.brightness,
                Direction::RightToLeft as u8,
                zones[0]
            ),
            Pattern::Effect {
                mode,
                speed,
                direction,
                color,
            } => format!(
                "{},{},{},{},{}",
                mode, speed, state.brightness, direction as u8, color
            ),
        }
    }

    fn probes(&self) -> Vec<Probe<Lighting>> {
        vec![keyboard_probe()]
    }

    fn candidates(&self, request: &EffectRequest) -> Result<Vec<Candidate<Lighting>>> {
        keyboard_candidate(request.lighting())
    }
}
