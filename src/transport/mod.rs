pub mod acpi_call;
pub mod emulated;

pub use acpi_call::AcpiCall;
pub use emulated::EmulatedFirmware;

use tracing::warn;

use crate::config::{TransportConfig, TransportKind};
use crate::dispatch::Transport;
use crate::sysfs::SysfsRoot;

/// Build the configured call primitive.
pub fn open(config: &TransportConfig, sysfs: &SysfsRoot) -> Box<dyn Transport> {
    match config.kind {
        TransportKind::Emulated => Box::new(EmulatedFirmware::new()),
        TransportKind::AcpiCall => {
            let transport = AcpiCall::new(
                sysfs.clone(),
                &config.call_path,
                &config.acpi_method,
                config.instance,
            );
            if !transport.is_available() {
                warn!(
                    path = %config.call_path,
                    "acpi_call interface not found; is the acpi_call module loaded?"
                );
            }
            Box::new(transport)
        }
    }
}
