//! Transport over the `acpi_call` kernel module: a command naming the WMI
//! method object is written to `/proc/acpi/call`, and the evaluation result
//! is read back from the same file.

use std::path::PathBuf;

use tracing::debug;

use crate::dispatch::Transport;
use crate::error::{Error, Result};
use crate::sysfs::SysfsRoot;

pub const DEFAULT_CALL_PATH: &str = "proc/acpi/call";
pub const DEFAULT_METHOD: &str = "\\_SB.PC00.WMID.WMBH";

#[derive(Debug, Clone)]
pub struct AcpiCall {
    sysfs: SysfsRoot,
    call_path: PathBuf,
    method_path: String,
    instance: u32,
}

impl AcpiCall {
    pub fn new(
        sysfs: SysfsRoot,
        call_path: impl Into<PathBuf>,
        method_path: impl Into<String>,
        instance: u32,
    ) -> Self {
        Self {
            sysfs,
            call_path: call_path.into(),
            method_path: method_path.into(),
            instance,
        }
    }

    pub fn is_available(&self) -> bool {
        self.sysfs.exists(&self.call_path)
    }
}

impl Transport for AcpiCall {
    fn name(&self) -> &str {
        "acpi_call"
    }

    fn invoke(&mut self, method_id: u32, input: &[u8]) -> Result<Vec<u8>> {
        let command = format_command(&self.method_path, self.instance, method_id, input);
        debug!(%command, "acpi_call");
        let reply = self.sysfs.exchange(&self.call_path, &command)?;
        parse_reply(method_id, &reply)
    }
}

/// `<method> <instance> <method id> b<payload hex>`
pub fn format_command(method_path: &str, instance: u32, method_id: u32, input: &[u8]) -> String {
    let payload: String = input.iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{} {:#x} {:#x} b{}",
        method_path, instance, method_id, payload
    )
}

/// Parse an `acpi_call` reply.
///
/// Buffers come back as `{0x00, 0x1f}`. Some firmware answers set methods
/// with a bare integer status instead, which is mapped to a one-byte status
/// response (or a firmware error when non-zero).
pub fn parse_reply(method_id: u32, reply: &str) -> Result<Vec<u8>> {
    let reply = reply.trim_end_matches('\0').trim();

    if let Some(inner) = reply.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
        return inner
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| parse_int(t).and_then(|v| u8::try_from(v).ok()))
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| Error::Transport(format!("malformed buffer reply: {}", reply)));
    }

    if let Some(status) = parse_int(reply) {
        return match u32::try_from(status) {
            Ok(0) => Ok(vec![0]),
            Ok(status) => Err(Error::Firmware {
                method: method_id,
                status,
            }),
            Err(_) => Err(Error::Transport(format!("status out of range: {}", reply))),
        };
    }

    Err(Error::Transport(format!(
        "acpi_call failed for method {}: {}",
        method_id, reply
    )))
}

fn parse_int(token: &str) -> Option<u64> {
    match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => token.parse().ok(),
    }
}
