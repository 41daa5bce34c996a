//! Fan behavior structure (4 bytes): `[mode, cpu duty, gpu duty, reserved]`.
//! The get body carries the first three bytes.

use super::{MethodCall, MethodId, check_response};
use crate::error::{Error, Result};
use crate::platform::DutyRange;

pub const LEN: usize = 4;

const MODE_AUTO: u8 = 0;
const MODE_MANUAL: u8 = 1;
const ALL_FANS: u8 = 0x03;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanState {
    Auto,
    Manual { cpu: u8, gpu: u8 },
}

pub fn encode(state: &FanState, range: DutyRange) -> Result<[u8; LEN]> {
    match *state {
        FanState::Auto => Ok([MODE_AUTO, 0, 0, 0]),
        FanState::Manual { cpu, gpu } => {
            let min = range.min.max(DutyRange::MIN_MANUAL);
            for (field, duty) in [("cpu fan duty", cpu), ("gpu fan duty", gpu)] {
                if duty < min || !range.contains(i64::from(duty)) {
                    return Err(Error::OutOfRange {
                        field,
                        value: i64::from(duty),
                        min: i64::from(min),
                        max: i64::from(range.max),
                    });
                }
            }
            Ok([MODE_MANUAL, cpu, gpu, 0])
        }
    }
}

pub fn set_call(state: &FanState, range: DutyRange) -> Result<MethodCall> {
    Ok(MethodCall::new(MethodId::SetFan, encode(state, range)?.to_vec()))
}

pub fn get_call() -> MethodCall {
    MethodCall::new(MethodId::GetFan, vec![ALL_FANS])
}

pub fn decode(response: &[u8]) -> Result<FanState> {
    let method = MethodId::GetFan;
    let body = check_response(method, response)?;
    match body[0] {
        MODE_AUTO => Ok(FanState::Auto),
        MODE_MANUAL => {
            let (cpu, gpu) = (body[1], body[2]);
            if cpu > 100 || gpu > 100 {
                return Err(Error::protocol(
                    method.id(),
                    format!("fan duty out of range: cpu={} gpu={}", cpu, gpu),
                ));
            }
            Ok(FanState::Manual { cpu, gpu })
        }
        other => Err(Error::protocol(
            method.id(),
            format!("unknown fan mode {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode(&FanState::Auto, DutyRange::FULL).unwrap(), [0, 0, 0, 0]);
        assert_eq!(
            encode(&FanState::Manual { cpu: 40, gpu: 75 }, DutyRange::FULL).unwrap(),
            [1, 40, 75, 0]
        );
    }

    #[test]
    fn test_encode_respects_platform_range() {
        let range = DutyRange { min: 20, max: 90 };
        assert!(matches!(
            encode(&FanState::Manual { cpu: 10, gpu: 50 }, range),
            Err(Error::OutOfRange { field: "cpu fan duty", .. })
        ));
        assert!(matches!(
            encode(&FanState::Manual { cpu: 50, gpu: 95 }, range),
            Err(Error::OutOfRange { field: "gpu fan duty", .. })
        ));
    }

    #[test]
    fn test_zero_duty_is_never_encoded_as_manual() {
        let open_floor = DutyRange { min: 0, max: 100 };
        for state in [
            FanState::Manual { cpu: 0, gpu: 0 },
            FanState::Manual { cpu: 0, gpu: 50 },
        ] {
            assert!(matches!(
                encode(&state, open_floor),
                Err(Error::OutOfRange { min: 1, .. })
            ));
        }
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode(&[0, 0, 33, 44]).unwrap(), FanState::Auto);
        assert_eq!(
            decode(&[0, 1, 33, 44]).unwrap(),
            FanState::Manual { cpu: 33, gpu: 44 }
        );
        assert!(matches!(decode(&[0, 2, 0, 0]), Err(Error::Protocol { .. })));
        assert!(matches!(decode(&[0, 1, 101, 0]), Err(Error::Protocol { .. })));
        assert!(matches!(decode(&[0, 1]), Err(Error::Protocol { .. })));
    }
}
