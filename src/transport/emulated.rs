//! In-memory model of the gaming WMI dispatcher.
//!
//! Handles are cheap clones sharing one firmware instance, so a test can keep
//! a handle for inspection (call log, LED output) after handing another to a
//! [`Dispatcher`](crate::dispatch::Dispatcher). Quirks reproduce the firmware
//! variants the bridge has to tolerate.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::codec::setting::{Profile, choices_mask};
use crate::codec::{MethodId, dedicated, unified};
use crate::dispatch::Transport;
use crate::error::{Error, Result};

pub const STATUS_INVALID_PARAMETER: u8 = 0x01;
pub const STATUS_NOT_SUPPORTED: u32 = 0xfe;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub method: u32,
    pub input: Vec<u8>,
}

/// What the logo LED physically shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedOutput {
    pub enabled: bool,
    pub brightness: u8,
}

impl LedOutput {
    pub fn visible(self) -> bool {
        self.enabled && self.brightness > 0
    }
}

#[derive(Debug, Default)]
struct Quirks {
    ignore_dedicated_enable: bool,
    status: HashMap<MethodId, u8>,
    truncate: HashMap<MethodId, usize>,
    dropped: HashSet<MethodId>,
    missing: HashSet<MethodId>,
}

#[derive(Debug)]
struct Firmware {
    lighting: [[u8; unified::LEN]; 2],
    logo: [u8; dedicated::LEN],
    fan: [u8; 3],
    profile: u8,
    choices: u8,
    limiter: u8,
    led: LedOutput,
    quirks: Quirks,
    log: Vec<Invocation>,
}

impl Default for Firmware {
    fn default() -> Self {
        let mut keyboard = [0xffu8; unified::LEN];
        keyboard[0] = 1;
        keyboard[1] = 0;
        keyboard[2] = 100;
        keyboard[15] = 1;
        let mut logo = [0u8; unified::LEN];
        logo[0] = 2;
        logo[2] = 100;
        logo[3..6].copy_from_slice(&[0xff, 0xff, 0xff]);
        logo[15] = 1;

        Self {
            lighting: [keyboard, logo],
            logo: [dedicated::SELECTOR, 0xff, 0xff, 0xff, 100, 1],
            fan: [0, 0, 0],
            profile: Profile::Balanced.value(),
            choices: choices_mask(&Profile::ALL),
            limiter: 0,
            led: LedOutput {
                enabled: true,
                brightness: 100,
            },
            quirks: Quirks::default(),
            log: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmulatedFirmware {
    inner: Arc<Mutex<Firmware>>,
}

impl EmulatedFirmware {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Firmware> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accept the dedicated enable byte but do not gate the LED on it.
    pub fn ignore_dedicated_enable(&self, ignore: bool) {
        self.lock().quirks.ignore_dedicated_enable = ignore;
    }

    /// Answer `method` with a failure status byte.
    pub fn fail_with(&self, method: MethodId, status: u8) {
        self.lock().quirks.status.insert(method, status);
    }

    /// Cut `bytes` off the end of every `method` response.
    pub fn truncate(&self, method: MethodId, bytes: usize) {
        self.lock().quirks.truncate.insert(method, bytes);
    }

    /// Acknowledge writes to `method` without applying them.
    pub fn drop_writes(&self, method: MethodId) {
        self.lock().quirks.dropped.insert(method);
    }

    /// Make the primitive itself report `method` as unsupported.
    pub fn remove_method(&self, method: MethodId) {
        self.lock().quirks.missing.insert(method);
    }

    pub fn set_profile_choices(&self, choices: &[Profile]) {
        self.lock().choices = choices_mask(choices);
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.lock().log.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().log.len()
    }

    pub fn clear_calls(&self) {
        self.lock().log.clear();
    }

    pub fn led(&self) -> LedOutput {
        self.lock().led
    }

    pub fn lighting(&self, group: unified::Group) -> [u8; unified::LEN] {
        self.lock().lighting[group as usize - 1]
    }

    pub fn logo_bytes(&self) -> [u8; dedicated::LEN] {
        self.lock().logo
    }
}

impl Transport for EmulatedFirmware {
    fn name(&self) -> &str {
        "emulated"
    }

    fn invoke(&mut self, method_id: u32, input: &[u8]) -> Result<Vec<u8>> {
        let mut fw = self.lock();
        fw.log.push(Invocation {
            method: method_id,
            input: input.to_vec(),
        });

        let Some(method) = MethodId::from_id(method_id) else {
            return Err(Error::Firmware {
                method: method_id,
                status: STATUS_NOT_SUPPORTED,
            });
        };
        if fw.quirks.missing.contains(&method) {
            return Err(Error::Firmware {
                method: method_id,
                status: STATUS_NOT_SUPPORTED,
            });
        }

        let forced_status = fw.quirks.status.get(&method).copied();
        let mut response = match forced_status {
            Some(status) => failure(method, status),
            None if input.len() != method.payload_len() => {
                failure(method, STATUS_INVALID_PARAMETER)
            }
            None => fw.handle(method, input),
        };

        if let Some(&cut) = fw.quirks.truncate.get(&method) {
            let len = response.len().saturating_sub(cut);
            response.truncate(len);
        }
        Ok(response)
    }
}

fn failure(method: MethodId, status: u8) -> Vec<u8> {
    let mut buf = vec![0u8; method.response_len()];
    buf[0] = status;
    buf
}

fn ok(body: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(body.len() + 1);
    buf.push(0);
    buf.extend_from_slice(body);
    buf
}

impl Firmware {
    fn handle(&mut self, method: MethodId, input: &[u8]) -> Vec<u8> {
        let apply = !self.quirks.dropped.contains(&method);
        match method {
            MethodId::SetLighting => {
                if unified::decode_body(input).is_err() {
                    return failure(method, STATUS_INVALID_PARAMETER);
                }
                if apply {
                    let slot = usize::from(input[0]) - 1;
                    self.lighting[slot].copy_from_slice(input);
                    if input[0] == unified::Group::Logo as u8 {
                        self.led = LedOutput {
                            enabled: input[15] & 0x01 != 0,
                            brightness: input[2],
                        };
                    }
                }
                ok(&[])
            }
            MethodId::GetLighting => match input[0] {
                g @ (1 | 2) => ok(&self.lighting[usize::from(g) - 1]),
                _ => failure(method, STATUS_INVALID_PARAMETER),
            },
            MethodId::SetLogo => {
                if dedicated::decode_body(input).is_err() {
                    return failure(method, STATUS_INVALID_PARAMETER);
                }
                if apply {
                    self.logo.copy_from_slice(input);
                    self.led.brightness = input[4];
                    if !self.quirks.ignore_dedicated_enable {
                        self.led.enabled = input[5] == 1;
                    }
                }
                ok(&[])
            }
            MethodId::GetLogo => {
                if input[0] != dedicated::SELECTOR {
                    return failure(method, STATUS_INVALID_PARAMETER);
                }
                ok(&self.logo)
            }
            MethodId::SetFan => {
                let valid = match input[0] {
                    0 => true,
                    1 => input[1] <= 100 && input[2] <= 100,
                    _ => false,
                };
                if !valid {
                    return failure(method, STATUS_INVALID_PARAMETER);
                }
                if apply {
                    self.fan.copy_from_slice(&input[..3]);
                }
                ok(&[])
            }
            MethodId::GetFan => ok(&self.fan),
            MethodId::SetMisc => {
                let accepted = input[0] == 0x0B
                    && Profile::from_value(input[1]).is_some()
                    && self.choices & (1 << input[1]) != 0;
                if !accepted {
                    return failure(method, STATUS_INVALID_PARAMETER);
                }
                if apply {
                    self.profile = input[1];
                }
                ok(&[])
            }
            MethodId::GetMisc => match input[0] {
                0x0A => ok(&[self.choices]),
                0x0B => ok(&[self.profile]),
                _ => failure(method, STATUS_INVALID_PARAMETER),
            },
            MethodId::SetBatteryHealth => {
                if input[..2] != [1, 1] || input[2] > 1 {
                    return failure(method, STATUS_INVALID_PARAMETER);
                }
                if apply {
                    self.limiter = input[2];
                }
                ok(&[])
            }
            MethodId::GetBatteryHealth => {
                if input != [1, 1] {
                    return failure(method, STATUS_INVALID_PARAMETER);
                }
                ok(&[self.limiter])
            }
        }
    }
}
