use std::path::PathBuf;

use crate::platform::Feature;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("sysfs read failed: {path}: {source}")]
    SysfsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("sysfs write failed: {path}: {source}")]
    SysfsWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("hardware identification failed: {0}")]
    Identification(String),

    #[error("{0} is not supported on this platform")]
    UnsupportedFeature(Feature),

    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("attribute {0} is read-only")]
    ReadOnly(String),

    #[error("invalid input {input:?}: {reason}")]
    Format { input: String, reason: String },

    #[error("{field} out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("firmware rejected method {method} with status {status:#04x}")]
    Firmware { method: u32, status: u32 },

    #[error("protocol violation on method {method}: {detail}")]
    Protocol { method: u32, detail: String },

    #[error("{attribute}: write was not confirmed (wanted {expected}, firmware reports {actual})")]
    VerificationFailed {
        attribute: String,
        expected: String,
        actual: String,
    },

    #[error("firmware transport error: {0}")]
    Transport(String),
}

impl Error {
    pub(crate) fn format(input: &str, reason: impl Into<String>) -> Self {
        Error::Format {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn protocol(method: u32, detail: impl Into<String>) -> Self {
        Error::Protocol {
            method,
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
