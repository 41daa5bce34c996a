//! Single-value settings: the thermal profile (misc setting methods) and the
//! battery charge limiter (battery health methods).

use super::{MethodCall, MethodId, check_response, decode_bool};
use crate::error::{Error, Result};
use std::fmt;

const MISC_PROFILE_CHOICES: u8 = 0x0A;
const MISC_THERMAL_PROFILE: u8 = 0x0B;

const BATTERY_PRIMARY: u8 = 0x01;
const BATTERY_FN_LIMITER: u8 = 0x01;

/// Thermal profiles, named after the kernel's platform_profile choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Profile {
    LowPower,
    Quiet,
    Balanced,
    BalancedPerformance,
    Performance,
}

impl Profile {
    pub const ALL: [Profile; 5] = [
        Profile::LowPower,
        Profile::Quiet,
        Profile::Balanced,
        Profile::BalancedPerformance,
        Profile::Performance,
    ];

    pub fn value(self) -> u8 {
        match self {
            Profile::Quiet => 0x00,
            Profile::Balanced => 0x01,
            Profile::BalancedPerformance => 0x04,
            Profile::Performance => 0x05,
            Profile::LowPower => 0x06,
        }
    }

    pub fn from_value(v: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.value() == v)
    }

    pub fn name(self) -> &'static str {
        match self {
            Profile::LowPower => "low-power",
            Profile::Quiet => "quiet",
            Profile::Balanced => "balanced",
            Profile::BalancedPerformance => "balanced-performance",
            Profile::Performance => "performance",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn set_profile_call(profile: Profile) -> MethodCall {
    MethodCall::new(
        MethodId::SetMisc,
        vec![MISC_THERMAL_PROFILE, profile.value()],
    )
}

pub fn get_profile_call() -> MethodCall {
    MethodCall::new(MethodId::GetMisc, vec![MISC_THERMAL_PROFILE])
}

pub fn decode_profile(response: &[u8]) -> Result<Profile> {
    let method = MethodId::GetMisc;
    let body = check_response(method, response)?;
    Profile::from_value(body[0]).ok_or_else(|| {
        Error::protocol(method.id(), format!("unknown thermal profile {:#04x}", body[0]))
    })
}

pub fn get_choices_call() -> MethodCall {
    MethodCall::new(MethodId::GetMisc, vec![MISC_PROFILE_CHOICES])
}

/// Supported profiles as reported by firmware: bit `n` set means profile
/// value `n` is accepted.
pub fn decode_choices(response: &[u8]) -> Result<Vec<Profile>> {
    let method = MethodId::GetMisc;
    let mask = check_response(method, response)?[0];
    let choices: Vec<Profile> = Profile::ALL
        .into_iter()
        .filter(|p| mask & (1 << p.value()) != 0)
        .collect();
    if choices.is_empty() {
        return Err(Error::protocol(
            method.id(),
            format!("profile choice mask {:#04x} names no known profile", mask),
        ));
    }
    Ok(choices)
}

pub fn choices_mask(choices: &[Profile]) -> u8 {
    choices.iter().fold(0, |mask, p| mask | (1 << p.value()))
}

pub fn set_limiter_call(enabled: bool) -> MethodCall {
    MethodCall::new(
        MethodId::SetBatteryHealth,
        vec![BATTERY_PRIMARY, BATTERY_FN_LIMITER, u8::from(enabled)],
    )
}

pub fn get_limiter_call() -> MethodCall {
    MethodCall::new(
        MethodId::GetBatteryHealth,
        vec![BATTERY_PRIMARY, BATTERY_FN_LIMITER],
    )
}

pub fn decode_limiter(response: &[u8]) -> Result<bool> {
    let method = MethodId::GetBatteryHealth;
    let body = check_response(method, response)?;
    decode_bool(method, "limiter", body[0])
}
