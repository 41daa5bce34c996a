//! Battery charge limiter: `1` caps charging to prolong battery life, `0`
//! charges fully.

use super::{Control, flag};
use crate::codec::setting;
use crate::dispatch::{Candidate, Probe};
use crate::error::Result;
use crate::platform::Feature;

pub const NAME: &str = "battery_limiter";

fn limiter_probe() -> Probe<bool> {
    Probe {
        label: "battery",
        call: setting::get_limiter_call(),
        decode: setting::decode_limiter,
    }
}

#[derive(Debug, Default)]
pub struct BatteryLimiter;

impl Control for BatteryLimiter {
    type Request = bool;
    type State = bool;

    const NAME: &'static str = NAME;
    const FEATURE: Feature = Feature::BatteryLimiter;

    fn parse(&self, text: &str) -> Result<bool> {
        flag(text, text.trim(), "battery limiter")
    }

    fn format(&self, state: &bool) -> String {
        u8::from(*state).to_string()
    }

    fn probes(&self) -> Vec<Probe<bool>> {
        vec![limiter_probe()]
    }

    fn candidates(&self, request: &bool) -> Result<Vec<Candidate<bool>>> {
        Ok(vec![Candidate {
            label: "battery",
            calls: vec![setting::set_limiter_call(*request)],
            verify: limiter_probe(),
            expected: *request,
        }])
    }
}
