//! Fan attribute: `auto` or `cpu=N,gpu=N`.

use super::{Control, fields, number};
use crate::codec::fan::{self, FanState};
use crate::dispatch::{Candidate, Probe};
use crate::error::{Error, Result};
use crate::platform::{DutyRange, Feature};

pub const NAME: &str = "fan_speed";

const AUTO: &str = "auto";

fn fan_probe() -> Probe<FanState> {
    Probe {
        label: "fan",
        call: fan::get_call(),
        decode: fan::decode,
    }
}

#[derive(Debug)]
pub struct FanSpeed {
    duty: DutyRange,
}

impl FanSpeed {
    pub fn new(duty: DutyRange) -> Self {
        Self { duty }
    }

    fn duty(&self, text: &str, field: &str, key: &str) -> Result<u8> {
        let value = field
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or_else(|| Error::format(text, format!("expected {}=N", key)))?;
        let duty = number(
            text,
            value.trim(),
            &format!("{} duty", key),
            i64::from(self.duty.min.max(DutyRange::MIN_MANUAL)),
            i64::from(self.duty.max),
        )?;
        Ok(duty as u8)
    }
}

impl Control for FanSpeed {
    type Request = FanState;
    type State = FanState;

    const NAME: &'static str = NAME;
    const FEATURE: Feature = Feature::Fan;

    fn parse(&self, text: &str) -> Result<FanState> {
        if text.trim().eq_ignore_ascii_case(AUTO) {
            return Ok(FanState::Auto);
        }
        let parts = fields(text, 2, "cpu=N,gpu=N")?;
        Ok(FanState::Manual {
            cpu: self.duty(text, parts[0], "cpu")?,
            gpu: self.duty(text, parts[1], "gpu")?,
        })
    }

    fn format(&self, state: &FanState) -> String {
        match state {
            FanState::Auto => AUTO.to_string(),
            FanState::Manual { cpu, gpu } => format!("cpu={},gpu={}", cpu, gpu),
        }
    }

    fn probes(&self) -> Vec<Probe<FanState>> {
        vec![fan_probe()]
    }

    fn candidates(&self, request: &FanState) -> Result<Vec<Candidate<FanState>>> {
        Ok(vec![Candidate {
            label: "fan",
            calls: vec![fan::set_call(request, self.duty)?],
            verify: fan_probe(),
            expected: *request,
        }])
    }
}
