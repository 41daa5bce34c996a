//! Built-in identification records for machines whose firmware behavior has
//! been validated. Specific entries first; matching stops at the first hit.

use super::{Capability, DutyRange, Platform};
use Capability::*;

#[derive(Debug)]
pub struct ModelRecord {
    pub name: &'static str,
    pub vendor: &'static str,
    pub products: &'static [&'static str],
    pub capabilities: &'static [Capability],
    pub fan_duty: DutyRange,
}

impl ModelRecord {
    pub(crate) fn to_platform(&self) -> Platform {
        Platform {
            name: self.name.to_string(),
            capabilities: self.capabilities.iter().copied().collect(),
            fan_duty: self.fan_duty,
        }
    }
}

pub const BUILTIN: &[ModelRecord] = &[
    ModelRecord {
        name: "Acer Predator Helios Neo 16 (PHN16-72)",
        vendor: "acer",
        products: &["PHN16-72"],
        capabilities: &[
            Keyboard4Zone,
            BackLogo,
            LogoDedicatedMethods,
            LogoIgnoresDedicatedEnable,
            FanManual,
            PlatformProfile,
            BatteryLimiter,
        ],
        fan_duty: DutyRange::FULL,
    },
    ModelRecord {
        name: "Acer Predator Helios Neo 16 (PHN16-71)",
        vendor: "acer",
        products: &["PHN16-71"],
        capabilities: &[
            Keyboard4Zone,
            BackLogo,
            LogoUnifiedOnly,
            FanManual,
            PlatformProfile,
            BatteryLimiter,
        ],
        fan_duty: DutyRange::FULL,
    },
    ModelRecord {
        name: "Acer Predator Helios 16/18 (PH16-71, PH18-71)",
        vendor: "acer",
        products: &["PH16-71", "PH18-71"],
        capabilities: &[Keyboard4Zone, FanManual, PlatformProfile, BatteryLimiter],
        fan_duty: DutyRange::FULL,
    },
    ModelRecord {
        name: "Acer Nitro 5/V 15 (AN515-58, AN517-55, ANV15-51)",
        vendor: "acer",
        products: &["AN515-58", "AN517-55", "ANV15-51"],
        capabilities: &[Keyboard4Zone, FanManual, PlatformProfile, BatteryLimiter],
        fan_duty: DutyRange::FULL,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logo_models_pick_exactly_one_path() {
        for model in BUILTIN {
            let caps = model.to_platform().capabilities;
            if caps.contains(BackLogo) {
                assert!(
                    caps.contains(LogoDedicatedMethods) ^ caps.contains(LogoUnifiedOnly),
                    "{} must declare exactly one logo path",
                    model.name
                );
            } else {
                assert!(!caps.contains(LogoDedicatedMethods));
                assert!(!caps.contains(LogoIgnoresDedicatedEnable));
            }
        }
    }

    #[test]
    fn test_every_model_supports_profile() {
        for model in BUILTIN {
            assert!(model.capabilities.contains(&PlatformProfile), "{}", model.name);
        }
    }
}
