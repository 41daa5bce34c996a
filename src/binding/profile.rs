//! Platform profile attributes.
//!
//! The set of accepted profiles is reported by firmware. It is fetched at
//! most once per bridge and shared between `platform_profile` (which
//! validates against it) and the read-only `platform_profile_choices`.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::Control;
use crate::codec::setting::{self, Profile};
use crate::dispatch::{Candidate, Probe, Session};
use crate::error::{Error, Result};
use crate::platform::Feature;

pub const NAME: &str = "platform_profile";
pub const CHOICES_NAME: &str = "platform_profile_choices";

fn choices_probe() -> Probe<Vec<Profile>> {
    Probe {
        label: "choices",
        call: setting::get_choices_call(),
        decode: setting::decode_choices,
    }
}

fn profile_probe() -> Probe<Profile> {
    Probe {
        label: "profile",
        call: setting::get_profile_call(),
        decode: setting::decode_profile,
    }
}

/// Firmware-reported profile choices, cached after the first fetch.
#[derive(Debug, Default)]
pub struct ProfileChoices {
    cached: Mutex<Option<Vec<Profile>>>,
}

impl ProfileChoices {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn cached(&self) -> Option<Vec<Profile>> {
        self.cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, choices: &[Profile]) {
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = Some(choices.to_vec());
    }

    /// Return the cached choices, fetching them through `session` if needed.
    pub fn get(&self, session: &mut Session<'_>) -> Result<Vec<Profile>> {
        if let Some(choices) = self.cached() {
            return Ok(choices);
        }
        let choices = session.probe(&choices_probe())?;
        debug!(?choices, "fetched profile choices");
        self.store(&choices);
        Ok(choices)
    }
}

fn names(profiles: &[Profile]) -> String {
    profiles
        .iter()
        .map(|p| p.name())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug)]
pub struct PlatformProfile {
    choices: Arc<ProfileChoices>,
}

impl PlatformProfile {
    pub fn new(choices: Arc<ProfileChoices>) -> Self {
        Self { choices }
    }
}

impl Control for PlatformProfile {
    type Request = Profile;
    type State = Profile;

    const NAME: &'static str = NAME;
    const FEATURE: Feature = Feature::PlatformProfile;

    fn parse(&self, text: &str) -> Result<Profile> {
        Profile::from_name(text.trim()).ok_or_else(|| {
            Error::format(
                text,
                format!("unknown profile, expected one of: {}", names(&Profile::ALL)),
            )
        })
    }

    fn format(&self, state: &Profile) -> String {
        state.name().to_string()
    }

    fn probes(&self) -> Vec<Probe<Profile>> {
        vec![profile_probe()]
    }

    fn candidates(&self, request: &Profile) -> Result<Vec<Candidate<Profile>>> {
        Ok(vec![Candidate {
            label: "misc",
            calls: vec![setting::set_profile_call(*request)],
            verify: profile_probe(),
            expected: *request,
        }])
    }

    fn validate(&self, request: &Profile, session: &mut Session<'_>) -> Result<()> {
        let choices = self.choices.get(session)?;
        if choices.contains(request) {
            Ok(())
        } else {
            Err(Error::format(
                request.name(),
                format!("firmware only accepts: {}", names(&choices)),
            ))
        }
    }
}

/// Read-only list of the profiles firmware accepts, space separated.
#[derive(Debug)]
pub struct PlatformProfileChoices {
    choices: Arc<ProfileChoices>,
}

impl PlatformProfileChoices {
    pub fn new(choices: Arc<ProfileChoices>) -> Self {
        Self { choices }
    }
}

impl Control for PlatformProfileChoices {
    type Request = ();
    type State = Vec<Profile>;

    const NAME: &'static str = CHOICES_NAME;
    const FEATURE: Feature = Feature::PlatformProfile;
    const WRITABLE: bool = false;

    fn parse(&self, _text: &str) -> Result<()> {
        Err(Error::ReadOnly(CHOICES_NAME.to_string()))
    }

    fn format(&self, state: &Vec<Profile>) -> String {
        names(state)
    }

    fn probes(&self) -> Vec<Probe<Vec<Profile>>> {
        vec![choices_probe()]
    }

    fn candidates(&self, _request: &()) -> Result<Vec<Candidate<Vec<Profile>>>> {
        Err(Error::ReadOnly(CHOICES_NAME.to_string()))
    }

    fn observe(&self, state: &Vec<Profile>) {
        self.choices.store(state);
    }
}
