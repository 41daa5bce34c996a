//! The single chokepoint for firmware interaction.
//!
//! A [`Dispatcher`] owns the call primitive behind a mutex. Callers open a
//! [`Session`] for a whole operation (writes plus read-back verification),
//! so no other call reaches the dispatcher object until the operation ends.

use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::codec::{MethodCall, check_response, check_status, hex};
use crate::error::{Error, Result};

/// The opaque synchronous firmware call primitive.
pub trait Transport: Send {
    /// Short name for logging.
    fn name(&self) -> &str;

    /// Invoke `method_id` with `input`. A non-success status reported by the
    /// primitive itself must come back as [`Error::Firmware`].
    fn invoke(&mut self, method_id: u32, input: &[u8]) -> Result<Vec<u8>>;
}

pub struct Dispatcher {
    transport: Mutex<Box<dyn Transport>>,
}

impl Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport: Mutex::new(transport),
        }
    }

    /// Block until the dispatcher is free and hold it for the session.
    pub fn session(&self) -> Session<'_> {
        Session {
            transport: self
                .transport
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// One-off validated call.
    pub fn call(&self, call: &MethodCall) -> Result<Vec<u8>> {
        self.session().call(call)
    }

    pub fn transport_name(&self) -> String {
        self.session().transport.name().to_string()
    }
}

/// A get call plus the decoder for its response.
#[derive(Debug, Clone)]
pub struct Probe<S> {
    pub label: &'static str,
    pub call: MethodCall,
    pub decode: fn(&[u8]) -> Result<S>,
}

/// One way of applying a request: an ordered call sequence, the read used to
/// verify it, and the state that read must report.
#[derive(Debug, Clone)]
pub struct Candidate<S> {
    pub label: &'static str,
    pub calls: Vec<MethodCall>,
    pub verify: Probe<S>,
    pub expected: S,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied<S> {
    Verified(S),
    /// Writes were accepted but no candidate's read-back matched.
    Mismatch { expected: S, actual: S },
}

enum Attempt<S> {
    Verified(S),
    Mismatch(S),
}

pub struct Session<'a> {
    transport: MutexGuard<'a, Box<dyn Transport>>,
}

impl Session<'_> {
    /// Invoke a call and validate its response length and status byte.
    pub fn call(&mut self, call: &MethodCall) -> Result<Vec<u8>> {
        assert_eq!(
            call.payload.len(),
            call.method.payload_len(),
            "payload length for {}",
            call.method
        );
        debug!(method = %call.method, tx = %hex(&call.payload), "invoke");

        let buf = self
            .transport
            .invoke(call.method.id(), &call.payload)
            .inspect_err(|e| debug!(method = %call.method, error = %e, "invoke failed"))?;
        debug!(method = %call.method, rx = %hex(&buf), "response");

        check_status(call.method, &buf)?;
        if buf.len() != call.expected_response_len {
            warn!(
                method = %call.method,
                expected = call.expected_response_len,
                got = buf.len(),
                buffer = %hex(&buf),
                "response length violates method contract"
            );
            return Err(Error::protocol(
                call.method.id(),
                format!(
                    "expected {} response bytes, got {} [{}]",
                    call.expected_response_len,
                    buf.len(),
                    hex(&buf)
                ),
            ));
        }
        check_response(call.method, &buf)?;
        Ok(buf)
    }

    pub fn probe<S>(&mut self, probe: &Probe<S>) -> Result<S> {
        let buf = self.call(&probe.call)?;
        (probe.decode)(&buf).inspect_err(|e| {
            warn!(probe = probe.label, buffer = %hex(&buf), error = %e, "undecodable response")
        })
    }

    /// Return the state from the first probe that succeeds; otherwise the
    /// last error.
    pub fn read<S>(&mut self, probes: &[Probe<S>]) -> Result<S> {
        let mut last_err = None;
        for probe in probes {
            match self.probe(probe) {
                Ok(state) => return Ok(state),
                Err(e) => {
                    debug!(probe = probe.label, error = %e, "probe failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| Error::protocol(0, "no read path available")))
    }

    /// Evaluate candidates in order and stop at the first one whose calls all
    /// succeed and whose read-back matches. A mismatching candidate is
    /// re-issued up to `retries` more times before moving on.
    pub fn apply<S>(&mut self, candidates: &[Candidate<S>], retries: u8) -> Result<Applied<S>>
    where
        S: PartialEq + Clone + Debug,
    {
        let mut last_err = None;
        let mut mismatch = None;

        for candidate in candidates {
            let mut wrote = false;
            match self.attempt(candidate, retries, &mut wrote) {
                Ok(Attempt::Verified(state)) => {
                    info!(candidate = candidate.label, "write verified");
                    return Ok(Applied::Verified(state));
                }
                Ok(Attempt::Mismatch(actual)) => {
                    warn!(
                        candidate = candidate.label,
                        expected = ?candidate.expected,
                        actual = ?actual,
                        "read-back does not match after retry"
                    );
                    mismatch = Some((candidate.expected.clone(), actual));
                }
                Err(e) => {
                    warn!(candidate = candidate.label, error = %e, "call sequence failed");
                    // Hardware moved past whatever an earlier read-back saw.
                    if wrote {
                        mismatch = None;
                    }
                    last_err = Some(e);
                }
            }
        }

        if let Some((expected, actual)) = mismatch {
            return Ok(Applied::Mismatch { expected, actual });
        }
        Err(last_err.unwrap_or_else(|| Error::protocol(0, "no call sequence available")))
    }

    /// `wrote` is set once any call of the sequence has been accepted.
    fn attempt<S>(
        &mut self,
        candidate: &Candidate<S>,
        retries: u8,
        wrote: &mut bool,
    ) -> Result<Attempt<S>>
    where
        S: PartialEq + Clone + Debug,
    {
        let mut actual = None;
        for attempt in 0..=retries {
            for call in &candidate.calls {
                self.call(call)?;
                *wrote = true;
            }
            let state = self.probe(&candidate.verify)?;
            if state == candidate.expected {
                return Ok(Attempt::Verified(state));
            }
            debug!(candidate = candidate.label, attempt, "read-back mismatch");
            actual = Some(state);
        }
        match actual {
            Some(state) => Ok(Attempt::Mismatch(state)),
            None => Err(Error::protocol(0, "verification never ran")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{MethodId, setting};
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Replays canned responses and records every call.
    struct Scripted {
        replies: VecDeque<Result<Vec<u8>>>,
        log: Arc<Mutex<Vec<(u32, Vec<u8>)>>>,
    }

    impl Transport for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn invoke(&mut self, method_id: u32, input: &[u8]) -> Result<Vec<u8>> {
            self.log.lock().unwrap().push((method_id, input.to_vec()));
            self.replies
                .pop_front()
                .unwrap_or_else(|| Err(Error::Firmware { method: method_id, status: 0xff }))
        }
    }

    fn dispatcher(replies: Vec<Result<Vec<u8>>>) -> (Dispatcher, Arc<Mutex<Vec<(u32, Vec<u8>)>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let transport = Scripted {
            replies: replies.into(),
            log: Arc::clone(&log),
        };
        (Dispatcher::new(Box::new(transport)), log)
    }

    fn limiter_candidate(label: &'static str, on: bool) -> Candidate<bool> {
        Candidate {
            label,
            calls: vec![setting::set_limiter_call(on)],
            verify: Probe {
                label: "limiter",
                call: setting::get_limiter_call(),
                decode: setting::decode_limiter,
            },
            expected: on,
        }
    }

    #[test]
    fn test_call_rejects_short_response() {
        let (d, _) = dispatcher(vec![Ok(vec![0])]);
        let err = d.call(&setting::get_profile_call()).unwrap_err();
        assert!(matches!(err, Error::Protocol { method: 23, .. }));
    }

    #[test]
    fn test_call_surfaces_status_byte() {
        let (d, _) = dispatcher(vec![Ok(vec![0x04])]);
        let err = d.call(&setting::set_profile_call(setting::Profile::Quiet)).unwrap_err();
        assert!(matches!(err, Error::Firmware { method: 22, status: 4 }));
    }

    #[test]
    fn test_call_reports_status_before_length() {
        let (d, _) = dispatcher(vec![Ok(vec![0x03])]);
        let err = d.call(&setting::get_profile_call()).unwrap_err();
        assert!(matches!(err, Error::Firmware { method: 23, status: 3 }));
    }

    #[test]
    fn test_apply_verifies_first_candidate() {
        let (d, log) = dispatcher(vec![Ok(vec![0]), Ok(vec![0, 1])]);
        let applied = d
            .session()
            .apply(&[limiter_candidate("only", true)], 1)
            .unwrap();
        assert_eq!(applied, Applied::Verified(true));

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].0, MethodId::SetBatteryHealth.id());
        assert_eq!(log[1].0, MethodId::GetBatteryHealth.id());
    }

    #[test]
    fn test_apply_retries_once_then_reports_mismatch() {
        let (d, log) = dispatcher(vec![
            Ok(vec![0]),
            Ok(vec![0, 0]),
            Ok(vec![0]),
            Ok(vec![0, 0]),
        ]);
        let applied = d
            .session()
            .apply(&[limiter_candidate("only", true)], 1)
            .unwrap();
        assert_eq!(
            applied,
            Applied::Mismatch {
                expected: true,
                actual: false
            }
        );
        assert_eq!(log.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_apply_falls_back_to_next_candidate() {
        let (d, log) = dispatcher(vec![
            Err(Error::Firmware { method: 24, status: 1 }),
            Ok(vec![0]),
            Ok(vec![0, 1]),
        ]);
        let applied = d
            .session()
            .apply(
                &[limiter_candidate("first", true), limiter_candidate("second", true)],
                0,
            )
            .unwrap();
        assert_eq!(applied, Applied::Verified(true));
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_apply_returns_last_error_when_all_fail() {
        let (d, _) = dispatcher(vec![
            Err(Error::Firmware { method: 24, status: 1 }),
            Err(Error::Firmware { method: 24, status: 2 }),
        ]);
        let err = d
            .session()
            .apply(
                &[limiter_candidate("first", true), limiter_candidate("second", true)],
                1,
            )
            .unwrap_err();
        assert!(matches!(err, Error::Firmware { status: 2, .. }));
    }

    #[test]
    fn test_later_write_failure_supersedes_earlier_mismatch() {
        let (d, _) = dispatcher(vec![
            Ok(vec![0]),
            Ok(vec![0, 0]),
            Ok(vec![0]),
            Ok(vec![0]),
        ]);
        let err = d
            .session()
            .apply(
                &[limiter_candidate("first", true), limiter_candidate("second", true)],
                0,
            )
            .unwrap_err();
        assert!(matches!(err, Error::Protocol { method: 25, .. }));
    }

    #[test]
    fn test_mismatch_kept_when_later_candidate_never_writes() {
        let (d, _) = dispatcher(vec![
            Ok(vec![0]),
            Ok(vec![0, 0]),
            Err(Error::Firmware { method: 24, status: 1 }),
        ]);
        let applied = d
            .session()
            .apply(
                &[limiter_candidate("first", true), limiter_candidate("second", true)],
                0,
            )
            .unwrap();
        assert_eq!(
            applied,
            Applied::Mismatch {
                expected: true,
                actual: false
            }
        );
    }

    #[test]
    fn test_read_tries_probes_in_order() {
        let (d, _) = dispatcher(vec![Ok(vec![0, 9, 9]), Ok(vec![0, 1])]);
        let probes = [
            Probe {
                label: "bad",
                call: setting::get_profile_call(),
                decode: |_| Ok(false),
            },
            Probe {
                label: "limiter",
                call: setting::get_limiter_call(),
                decode: setting::decode_limiter,
            },
        ];
        assert!(d.session().read(&probes).unwrap());
    }

    #[test]
    fn test_sessions_serialize_callers() {
        let (d, log) = dispatcher(
            (0..8)
                .flat_map(|_| [Ok(vec![0]), Ok(vec![0, 1])])
                .collect(),
        );
        let d = Arc::new(d);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let d = Arc::clone(&d);
                std::thread::spawn(move || {
                    d.session()
                        .apply(&[limiter_candidate("only", true)], 0)
                        .unwrap()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), Applied::Verified(true));
        }

        // Each set is immediately followed by its own verification read.
        let log = log.lock().unwrap();
        for pair in log.chunks(2) {
            assert_eq!(pair[0].0, MethodId::SetBatteryHealth.id());
            assert_eq!(pair[1].0, MethodId::GetBatteryHealth.id());
        }
    }
}
