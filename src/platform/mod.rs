pub mod identity;
pub mod models;

pub use identity::{HardwareIdentity, identify};

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// A single validated hardware capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Keyboard4Zone,
    BackLogo,
    FanManual,
    PlatformProfile,
    BatteryLimiter,
    LogoDedicatedMethods,
    LogoUnifiedOnly,
    /// Dedicated logo writes are accepted but the enable byte does not gate
    /// the LED. Seeded from the model table, never probed.
    LogoIgnoresDedicatedEnable,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Capability::Keyboard4Zone,
        Capability::BackLogo,
        Capability::FanManual,
        Capability::PlatformProfile,
        Capability::BatteryLimiter,
        Capability::LogoDedicatedMethods,
        Capability::LogoUnifiedOnly,
        Capability::LogoIgnoresDedicatedEnable,
    ];

    const fn bit(self) -> u16 {
        1 << self as u16
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Keyboard4Zone => "keyboard-4-zone",
            Capability::BackLogo => "back-logo",
            Capability::FanManual => "fan-manual",
            Capability::PlatformProfile => "platform-profile",
            Capability::BatteryLimiter => "battery-limiter",
            Capability::LogoDedicatedMethods => "logo-dedicated-methods",
            Capability::LogoUnifiedOnly => "logo-unified-only",
            Capability::LogoIgnoresDedicatedEnable => "logo-ignores-dedicated-enable",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed set of capabilities for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u16);

impl Capabilities {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Only universally safe features, for hardware that is not in the table.
    pub const fn minimal() -> Self {
        Self(Capability::PlatformProfile.bit())
    }

    pub fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    pub fn supports(self, feature: Feature) -> bool {
        self.contains(feature.capability())
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |c| self.contains(*c))
    }

    #[must_use]
    pub fn with(self, cap: Capability) -> Self {
        Self(self.0 | cap.bit())
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Capabilities::empty(), |caps, c| caps.with(c))
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Capability::as_str).collect();
        f.write_str(&names.join(","))
    }
}

/// User-visible feature, each gated by exactly one capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    Keyboard,
    BackLogo,
    Fan,
    PlatformProfile,
    BatteryLimiter,
}

impl Feature {
    pub fn capability(self) -> Capability {
        match self {
            Feature::Keyboard => Capability::Keyboard4Zone,
            Feature::BackLogo => Capability::BackLogo,
            Feature::Fan => Capability::FanManual,
            Feature::PlatformProfile => Capability::PlatformProfile,
            Feature::BatteryLimiter => Capability::BatteryLimiter,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Feature::Keyboard => "keyboard lighting",
            Feature::BackLogo => "back logo",
            Feature::Fan => "manual fan control",
            Feature::PlatformProfile => "platform profile",
            Feature::BatteryLimiter => "battery limiter",
        };
        f.write_str(name)
    }
}

/// Inclusive manual fan duty range, in percent. Zero would stop the fans, so
/// no range reaches below [`DutyRange::MIN_MANUAL`]; `auto` is how a fan
/// hands control back to firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyRange {
    pub min: u8,
    pub max: u8,
}

impl DutyRange {
    pub const MIN_MANUAL: u8 = 1;
    pub const FULL: Self = Self {
        min: Self::MIN_MANUAL,
        max: 100,
    };

    pub fn contains(self, duty: i64) -> bool {
        duty >= i64::from(self.min) && duty <= i64::from(self.max)
    }
}

impl Default for DutyRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// An identification record loaded from config at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRecord {
    pub name: String,
    pub vendor: String,
    /// Substrings matched against the DMI product name or board name.
    pub products: Vec<String>,
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub fan_min: Option<u8>,
    #[serde(default)]
    pub fan_max: Option<u8>,
}

impl PlatformRecord {
    fn matches(&self, id: &HardwareIdentity) -> bool {
        identity_matches(id, &self.vendor, self.products.iter().map(String::as_str))
    }

    fn to_platform(&self) -> Platform {
        Platform {
            name: self.name.clone(),
            capabilities: self.capabilities.iter().copied().collect(),
            fan_duty: DutyRange {
                min: self
                    .fan_min
                    .unwrap_or(DutyRange::FULL.min)
                    .max(DutyRange::MIN_MANUAL),
                max: self.fan_max.unwrap_or(DutyRange::FULL.max),
            },
        }
    }
}

/// The resolved platform the bridge runs on.
#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub name: String,
    pub capabilities: Capabilities,
    pub fan_duty: DutyRange,
}

impl Platform {
    pub const GENERIC_NAME: &'static str = "Unrecognized platform (minimal)";

    pub fn generic() -> Self {
        Self {
            name: Self::GENERIC_NAME.to_string(),
            capabilities: Capabilities::minimal(),
            fan_duty: DutyRange::FULL,
        }
    }

    pub fn is_generic(&self) -> bool {
        self.name == Self::GENERIC_NAME
    }
}

fn identity_matches<'a>(
    id: &HardwareIdentity,
    vendor: &str,
    mut products: impl Iterator<Item = &'a str>,
) -> bool {
    let id_vendor = id.vendor.to_ascii_lowercase();
    let id_product = id.product.to_ascii_lowercase();
    let id_board = id.board.to_ascii_lowercase();
    if !id_vendor.contains(&vendor.to_ascii_lowercase()) {
        return false;
    }
    products.any(|p| {
        let p = p.to_ascii_lowercase();
        !p.is_empty() && (id_product.contains(&p) || id_board.contains(&p))
    })
}

/// Pure table lookup against the built-in models only.
pub fn capabilities_for(id: &HardwareIdentity) -> Capabilities {
    resolve(Some(id), &[]).capabilities
}

/// Find the platform record for an identity. Config-supplied records are
/// consulted before the built-in table; anything unmatched (including an
/// unreadable identity) resolves to the minimal generic platform.
pub fn resolve(id: Option<&HardwareIdentity>, extra: &[PlatformRecord]) -> Platform {
    let Some(id) = id else {
        warn!("hardware identity unavailable, using minimal capabilities");
        return Platform::generic();
    };

    if let Some(record) = extra.iter().find(|r| r.matches(id)) {
        info!(model = %record.name, "matched configured platform record");
        return record.to_platform();
    }

    if let Some(model) = models::BUILTIN
        .iter()
        .find(|m| identity_matches(id, m.vendor, m.products.iter().copied()))
    {
        info!(model = model.name, "matched built-in platform record");
        return model.to_platform();
    }

    warn!(
        vendor = %id.vendor,
        product = %id.product,
        board = %id.board,
        "no platform record matched, using minimal capabilities"
    );
    Platform::generic()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_identity_is_minimal() {
        let id = HardwareIdentity::new("LENOVO", "21D2", "21D2");
        let caps = capabilities_for(&id);
        assert_eq!(caps, Capabilities::minimal());
        assert!(caps.supports(Feature::PlatformProfile));
        assert!(!caps.supports(Feature::Keyboard));
    }

    #[test]
    fn test_missing_identity_is_generic() {
        let platform = resolve(None, &[]);
        assert!(platform.is_generic());
        assert_eq!(platform.capabilities, Capabilities::minimal());
    }

    #[test]
    fn test_phn16_72_has_logo_quirk() {
        let id = HardwareIdentity::new("Acer", "Predator PHN16-72", "Fanta_RTX");
        let caps = capabilities_for(&id);
        assert!(caps.contains(Capability::BackLogo));
        assert!(caps.contains(Capability::LogoDedicatedMethods));
        assert!(caps.contains(Capability::LogoIgnoresDedicatedEnable));
        assert!(!caps.contains(Capability::LogoUnifiedOnly));
    }

    #[test]
    fn test_match_is_case_insensitive_and_uses_board() {
        let id = HardwareIdentity::new("ACER", "Unknown", "nitro an515-58");
        let caps = capabilities_for(&id);
        assert!(caps.supports(Feature::Keyboard));
        assert!(!caps.supports(Feature::BackLogo));
    }

    #[test]
    fn test_vendor_must_match() {
        let id = HardwareIdentity::new("Clevo", "Predator PHN16-72", "x");
        assert_eq!(capabilities_for(&id), Capabilities::minimal());
    }

    #[test]
    fn test_config_record_takes_precedence() {
        let id = HardwareIdentity::new("Acer", "Predator PHN16-72", "Fanta_RTX");
        let record = PlatformRecord {
            name: "Lab unit".to_string(),
            vendor: "acer".to_string(),
            products: vec!["PHN16-72".to_string()],
            capabilities: vec![Capability::FanManual],
            fan_min: Some(20),
            fan_max: None,
        };
        let platform = resolve(Some(&id), &[record]);
        assert_eq!(platform.name, "Lab unit");
        assert_eq!(
            platform.capabilities,
            Capabilities::empty().with(Capability::FanManual)
        );
        assert_eq!(platform.fan_duty, DutyRange { min: 20, max: 100 });
    }

    #[test]
    fn test_config_record_cannot_lower_duty_floor_to_zero() {
        let id = HardwareIdentity::new("Acer", "Lab", "x");
        let record = PlatformRecord {
            name: "Lab".to_string(),
            vendor: "Acer".to_string(),
            products: vec!["Lab".to_string()],
            capabilities: vec![Capability::FanManual],
            fan_min: Some(0),
            fan_max: Some(80),
        };
        let platform = resolve(Some(&id), &[record]);
        assert_eq!(platform.fan_duty, DutyRange { min: 1, max: 80 });
    }

    #[test]
    fn test_capabilities_display() {
        let caps: Capabilities = [Capability::BackLogo, Capability::Keyboard4Zone]
            .into_iter()
            .collect();
        assert_eq!(caps.to_string(), "keyboard-4-zone,back-logo");
    }

    #[test]
    fn test_duty_range_contains() {
        let range = DutyRange { min: 10, max: 90 };
        assert!(range.contains(10));
        assert!(range.contains(90));
        assert!(!range.contains(9));
        assert!(!range.contains(-1));
        assert!(!range.contains(91));
    }
}
