//! Back logo attribute: `RRGGBB,brightness,enable`.
//!
//! The logo can be driven through its dedicated 6-byte structure or through
//! the unified lighting structure (group 2). Which one the firmware honors
//! varies by model, so the plan is built from the platform's capabilities:
//!
//! - dedicated methods present: dedicated set first, unified set as fallback;
//! - dedicated enable ignored: the unified set is chained after the dedicated
//!   one so the enable flag lands;
//! - disabling with no authoritative path: brightness is additionally forced
//!   to 0 so the logo goes dark whichever path the firmware listens to.

use super::{Control, brightness, fields, flag};
use crate::codec::unified::{self, Group, Lighting, Pattern};
use crate::codec::{LogoState, MethodId, Rgb, dedicated};
use crate::dispatch::{Candidate, Probe};
use crate::error::{Error, Result};
use crate::platform::{Capabilities, Capability, Feature};

pub const NAME: &str = "back_logo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WritePath {
    Dedicated,
    Unified,
}

/// Which write paths exist and which of them the firmware fully honors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoPlan {
    dedicated: bool,
    ignores_dedicated_enable: bool,
    authoritative: Option<WritePath>,
}

impl LogoPlan {
    pub fn new(caps: Capabilities) -> Self {
        let unified_only = caps.contains(Capability::LogoUnifiedOnly);
        let dedicated = caps.contains(Capability::LogoDedicatedMethods) && !unified_only;
        let ignores_dedicated_enable = caps.contains(Capability::LogoIgnoresDedicatedEnable);

        let authoritative = if unified_only {
            Some(WritePath::Unified)
        } else if dedicated && !ignores_dedicated_enable {
            Some(WritePath::Dedicated)
        } else {
            None
        };

        Self {
            dedicated,
            ignores_dedicated_enable,
            authoritative,
        }
    }

    fn force_dark(&self, request: &LogoState) -> bool {
        !request.enabled && self.authoritative.is_none()
    }

    pub fn probes(&self) -> Vec<Probe<LogoState>> {
        let mut probes = Vec::with_capacity(2);
        if self.dedicated {
            probes.push(dedicated_probe());
        }
        probes.push(unified_probe());
        probes
    }

    pub fn candidates(&self, request: &LogoState) -> Result<Vec<Candidate<LogoState>>> {
        let force_dark = self.force_dark(request);
        let expected = if force_dark {
            LogoState {
                brightness: 0,
                ..*request
            }
        } else {
            *request
        };

        let mut candidates = Vec::with_capacity(2);

        if self.dedicated {
            let mut calls = vec![dedicated::set_call(request)?];
            if self.ignores_dedicated_enable {
                calls.push(unified::set_call(&unified_logo(request))?);
            }
            if force_dark {
                calls.push(dedicated::set_call(&expected)?);
            }
            candidates.push(Candidate {
                label: "dedicated",
                calls,
                verify: dedicated_probe(),
                expected,
            });
        }

        let mut calls = vec![unified::set_call(&unified_logo(request))?];
        if force_dark {
            calls.push(unified::set_call(&unified_logo(&expected))?);
        }
        candidates.push(Candidate {
            label: "unified",
            calls,
            verify: unified_probe(),
            expected,
        });

        Ok(candidates)
    }
}

/// The logo has a single zone; the remaining zone slots stay black.
fn unified_logo(state: &LogoState) -> Lighting {
    Lighting {
        group: Group::Logo,
        brightness: state.brightness,
        enabled: state.enabled,
        pattern: Pattern::Static {
            zones: [state.color, Rgb::BLACK, Rgb::BLACK, Rgb::BLACK],
        },
    }
}

fn decode_unified_logo(response: &[u8]) -> Result<LogoState> {
    let lighting = unified::decode(response)?;
    if lighting.group != Group::Logo {
        return Err(Error::protocol(
            MethodId::GetLighting.id(),
            format!("asked for logo lighting, got {:?}", lighting.group),
        ));
    }
    Ok(LogoState {
        color: lighting.pattern.primary_color(),
        brightness: lighting.brightness,
        enabled: lighting.enabled,
    })
}

fn dedicated_probe() -> Probe<LogoState> {
    Probe {
        label: "dedicated",
        call: dedicated::get_call(),
        decode: dedicated::decode,
    }
}

fn unified_probe() -> Probe<LogoState> {
    Probe {
        label: "unified",
        call: unified::get_call(Group::Logo),
        decode: decode_unified_logo,
    }
}

#[derive(Debug)]
pub struct BackLogo {
    plan: LogoPlan,
}

impl BackLogo {
    pub fn new(caps: Capabilities) -> Self {
        Self {
            plan: LogoPlan::new(caps),
        }
    }
}

impl Control for BackLogo {
    type Request = LogoState;
    type State = LogoState;

    const NAME: &'static str = NAME;
    const FEATURE: Feature = Feature::BackLogo;

    fn parse(&self, text: &str) -> Result<LogoState> {
        let parts = fields(text, 3, "color,brightness,enable")?;
        Ok(LogoState {
            color: Rgb::parse_hex(parts[0])?,
            brightness: brightness(text, parts[1])?,
            enabled: flag(text, parts[2], "enable")?,
        })
    }

    fn format(&self, state: &LogoState) -> String {
        format!(
            "{},{},{}",
            state.color,
            state.brightness,
            u8::from(state.enabled)
        )
    }

    fn probes(&self) -> Vec<Probe<LogoState>> {
        self.plan.probes()
    }

    fn candidates(&self, request: &LogoState) -> Result<Vec<Candidate<LogoState>>> {
        self.plan.candidates(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(list: &[Capability]) -> Capabilities {
        list.iter().copied().collect()
    }

    fn methods(candidate: &Candidate<LogoState>) -> Vec<MethodId> {
        candidate.calls.iter().map(|c| c.method).collect()
    }

    fn off() -> LogoState {
        LogoState {
            color: Rgb::BLACK,
            brightness: 0,
            enabled: false,
        }
    }

    #[test]
    fn test_parse_and_format() {
        let state = BackLogo::new(Capabilities::empty())
            .parse("00ff7f,45,1\n")
            .unwrap();
        assert_eq!(state.color, Rgb::new(0, 0xff, 0x7f));
        assert_eq!(state.brightness, 45);
        assert!(state.enabled);
        assert_eq!(
            BackLogo::new(Capabilities::empty()).format(&state),
            "00ff7f,45,1"
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let logo = BackLogo::new(Capabilities::empty());
        for text in ["GGGGGG,50,1", "ffffff,101,1", "ffffff,50,2", "ffffff,50"] {
            assert!(
                matches!(logo.parse(text), Err(Error::Format { .. })),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_ignored_enable_chains_unified_and_forces_dark() {
        let plan = LogoPlan::new(caps(&[
            Capability::BackLogo,
            Capability::LogoDedicatedMethods,
            Capability::LogoIgnoresDedicatedEnable,
        ]));
        let candidates = plan.candidates(&off()).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(
            methods(&candidates[0]),
            vec![MethodId::SetLogo, MethodId::SetLighting, MethodId::SetLogo]
        );
        // unified set carries enable = 0
        assert_eq!(candidates[0].calls[1].payload[0], Group::Logo as u8);
        assert_eq!(candidates[0].calls[1].payload[15], 0);
        // forced brightness
        assert_eq!(candidates[0].calls[2].payload[4], 0);
        assert_eq!(candidates[0].verify.call.method, MethodId::GetLogo);
        assert_eq!(candidates[1].verify.call.method, MethodId::GetLighting);
    }

    #[test]
    fn test_forced_dark_zeroes_expected_brightness() {
        let plan = LogoPlan::new(caps(&[
            Capability::BackLogo,
            Capability::LogoDedicatedMethods,
            Capability::LogoIgnoresDedicatedEnable,
        ]));
        let request = LogoState {
            color: Rgb::new(1, 2, 3),
            brightness: 70,
            enabled: false,
        };
        let candidates = plan.candidates(&request).unwrap();
        assert_eq!(candidates[0].calls[0].payload[4], 70);
        assert_eq!(candidates[0].expected.brightness, 0);
        assert_eq!(candidates[1].expected.brightness, 0);
        assert_eq!(
            methods(&candidates[1]),
            vec![MethodId::SetLighting, MethodId::SetLighting]
        );
    }

    #[test]
    fn test_enable_with_ignored_quirk_still_chains_unified() {
        let plan = LogoPlan::new(caps(&[
            Capability::BackLogo,
            Capability::LogoDedicatedMethods,
            Capability::LogoIgnoresDedicatedEnable,
        ]));
        let request = LogoState {
            color: Rgb::new(0xff, 0, 0),
            brightness: 100,
            enabled: true,
        };
        let candidates = plan.candidates(&request).unwrap();
        assert_eq!(
            methods(&candidates[0]),
            vec![MethodId::SetLogo, MethodId::SetLighting]
        );
        assert_eq!(candidates[0].expected, request);
    }

    #[test]
    fn test_authoritative_dedicated_path_does_not_force() {
        let plan = LogoPlan::new(caps(&[
            Capability::BackLogo,
            Capability::LogoDedicatedMethods,
        ]));
        let candidates = plan.candidates(&off()).unwrap();
        assert_eq!(methods(&candidates[0]), vec![MethodId::SetLogo]);
        assert_eq!(methods(&candidates[1]), vec![MethodId::SetLighting]);
    }

    #[test]
    fn test_unified_only_uses_single_path() {
        let plan = LogoPlan::new(caps(&[
            Capability::BackLogo,
            Capability::LogoDedicatedMethods,
            Capability::LogoUnifiedOnly,
        ]));
        let candidates = plan.candidates(&off()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(methods(&candidates[0]), vec![MethodId::SetLighting]);
        assert_eq!(plan.probes().len(), 1);
    }

    #[test]
    fn test_no_hint_forces_dark_on_unified() {
        let plan = LogoPlan::new(caps(&[Capability::BackLogo]));
        let candidates = plan.candidates(&off()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(
            methods(&candidates[0]),
            vec![MethodId::SetLighting, MethodId::SetLighting]
        );
    }

    #[test]
    fn test_unified_decode_takes_first_zone() {
        let mut response = vec![0u8];
        response.extend_from_slice(
            &unified::encode(&unified_logo(&LogoState {
                color: Rgb::new(9, 8, 7),
                brightness: 33,
                enabled: true,
            }))
            .unwrap(),
        );
        let state = decode_unified_logo(&response).unwrap();
        assert_eq!(state.color, Rgb::new(9, 8, 7));
        assert_eq!(state.brightness, 33);
        assert!(state.enabled);
    }
}
