//! Textual attributes on top of the dispatch engine.
//!
//! A [`Binding`] pairs a feature-specific [`Control`] (parse, format, call
//! plans) with the shared dispatcher and a private cache that tracks the
//! feature's state machine.

pub mod battery;
pub mod fan;
pub mod keyboard;
pub mod logo;
pub mod profile;

use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use crate::dispatch::{Applied, Candidate, Dispatcher, Probe, Session};
use crate::error::{Error, Result};
use crate::platform::{Capabilities, Feature};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    /// Not in the platform's capabilities. Terminal.
    Unsupported,
    /// No confirmed read or verified write yet.
    Unknown,
    /// Last operation succeeded and was confirmed by firmware.
    Known,
    /// A write landed but its read-back did not match.
    Degraded,
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeatureStatus::Unsupported => "unsupported",
            FeatureStatus::Unknown => "unknown",
            FeatureStatus::Known => "known",
            FeatureStatus::Degraded => "degraded",
        };
        f.write_str(s)
    }
}

/// One externally visible read/write endpoint.
pub trait Attribute: Send + Sync {
    fn name(&self) -> &'static str;
    fn feature(&self) -> Feature;
    fn writable(&self) -> bool;
    fn status(&self) -> FeatureStatus;
    fn read(&self) -> Result<String>;
    fn write(&self, text: &str) -> Result<()>;
}

/// Feature-specific half of a binding.
pub trait Control: Send + Sync {
    type Request: Debug;
    type State: Clone + PartialEq + Debug + Send;

    const NAME: &'static str;
    const FEATURE: Feature;
    const WRITABLE: bool = true;

    /// Text to request. Must not touch firmware.
    fn parse(&self, text: &str) -> Result<Self::Request>;

    /// State to text. Total.
    fn format(&self, state: &Self::State) -> String;

    /// Ordered get calls; the first that succeeds wins.
    fn probes(&self) -> Vec<Probe<Self::State>>;

    /// Ordered set call sequences for a request.
    fn candidates(&self, request: &Self::Request) -> Result<Vec<Candidate<Self::State>>>;

    /// Checks that need firmware-reported data, run inside the session
    /// before any set call.
    fn validate(&self, _request: &Self::Request, _session: &mut Session<'_>) -> Result<()> {
        Ok(())
    }

    /// Called with every confirmed state.
    fn observe(&self, _state: &Self::State) {}
}

#[derive(Debug)]
pub struct Binding<C: Control> {
    control: C,
    supported: bool,
    dispatcher: Arc<Dispatcher>,
    retries: u8,
    status: Mutex<FeatureStatus>,
}

impl<C: Control> Binding<C> {
    pub fn new(control: C, caps: Capabilities, dispatcher: Arc<Dispatcher>, retries: u8) -> Self {
        let supported = caps.supports(C::FEATURE);
        let status = if supported {
            FeatureStatus::Unknown
        } else {
            FeatureStatus::Unsupported
        };
        Self {
            control,
            supported,
            dispatcher,
            retries,
            status: Mutex::new(status),
        }
    }

    fn lock_status(&self) -> std::sync::MutexGuard<'_, FeatureStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_supported(&self) -> Result<()> {
        if self.supported {
            Ok(())
        } else {
            Err(Error::UnsupportedFeature(C::FEATURE))
        }
    }

    fn record(&self, status: FeatureStatus, state: &C::State) {
        self.control.observe(state);
        *self.lock_status() = status;
    }

    /// Read the current state from firmware.
    pub fn read_state(&self) -> Result<C::State> {
        self.ensure_supported()?;
        let probes = self.control.probes();
        let state = self.dispatcher.session().read(&probes)?;
        self.record(FeatureStatus::Known, &state);
        Ok(state)
    }

    /// Drive a parsed request through the candidate call sequences.
    pub fn apply(&self, request: &C::Request) -> Result<()> {
        self.ensure_supported()?;
        let candidates = self.control.candidates(request)?;

        let mut session = self.dispatcher.session();
        self.control.validate(request, &mut session)?;
        debug!(attribute = C::NAME, ?request, "applying");

        match session.apply(&candidates, self.retries)? {
            Applied::Verified(state) => {
                self.record(FeatureStatus::Known, &state);
                Ok(())
            }
            Applied::Mismatch { expected, actual } => {
                warn!(attribute = C::NAME, "marking feature degraded");
                let err = Error::VerificationFailed {
                    attribute: C::NAME.to_string(),
                    expected: self.control.format(&expected),
                    actual: self.control.format(&actual),
                };
                self.record(FeatureStatus::Degraded, &actual);
                Err(err)
            }
        }
    }
}

impl<C: Control> Attribute for Binding<C> {
    fn name(&self) -> &'static str {
        C::NAME
    }

    fn feature(&self) -> Feature {
        C::FEATURE
    }

    fn writable(&self) -> bool {
        C::WRITABLE
    }

    fn status(&self) -> FeatureStatus {
        *self.lock_status()
    }

    fn read(&self) -> Result<String> {
        let state = self.read_state()?;
        Ok(self.control.format(&state))
    }

    fn write(&self, text: &str) -> Result<()> {
        self.ensure_supported()?;
        if !C::WRITABLE {
            return Err(Error::ReadOnly(C::NAME.to_string()));
        }
        let request = self.control.parse(text)?;
        self.apply(&request)
    }
}

/// Split `text` into exactly `count` comma-separated fields.
pub(crate) fn fields<'a>(text: &'a str, count: usize, layout: &str) -> Result<Vec<&'a str>> {
    let parts: Vec<&str> = text.trim().split(',').map(str::trim).collect();
    if parts.len() != count {
        return Err(Error::format(
            text,
            format!("expected {} fields ({}), got {}", count, layout, parts.len()),
        ));
    }
    Ok(parts)
}

/// Parse an integer field and check it against an inclusive range.
pub(crate) fn number(text: &str, field: &str, name: &str, min: i64, max: i64) -> Result<i64> {
    let value: i64 = field
        .parse()
        .map_err(|_| Error::format(text, format!("{} must be an integer", name)))?;
    if value < min || value > max {
        return Err(Error::format(
            text,
            format!("{} must be {}..={}, got {}", name, min, max, value),
        ));
    }
    Ok(value)
}

pub(crate) fn brightness(text: &str, field: &str) -> Result<u8> {
    let value = number(
        text,
        field,
        "brightness",
        0,
        i64::from(crate::codec::MAX_BRIGHTNESS),
    )?;
    Ok(value as u8)
}

pub(crate) fn flag(text: &str, field: &str, name: &str) -> Result<bool> {
    match field {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(Error::format(text, format!("{} must be 0 or 1", name))),
    }
}
