use crate::error::{Error, Result};
use crate::sysfs::SysfsRoot;
use serde::Serialize;

const DMI_BASE: &str = "sys/class/dmi/id";

/// DMI identity of the running machine, read once at startup and only used
/// for table lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HardwareIdentity {
    pub vendor: String,
    pub product: String,
    pub board: String,
}

impl HardwareIdentity {
    pub fn new(
        vendor: impl Into<String>,
        product: impl Into<String>,
        board: impl Into<String>,
    ) -> Self {
        Self {
            vendor: vendor.into(),
            product: product.into(),
            board: board.into(),
        }
    }

    pub fn is_acer(&self) -> bool {
        self.vendor.to_ascii_lowercase().contains("acer")
    }
}

/// Read the DMI identity. Every field is required.
pub fn identify(sysfs: &SysfsRoot) -> Result<HardwareIdentity> {
    Ok(HardwareIdentity {
        vendor: read_field(sysfs, "sys_vendor")?,
        product: read_field(sysfs, "product_name")?,
        board: read_field(sysfs, "board_name")?,
    })
}

fn read_field(sysfs: &SysfsRoot, name: &str) -> Result<String> {
    let value = sysfs
        .read(format!("{}/{}", DMI_BASE, name))
        .map_err(|e| Error::Identification(format!("cannot read DMI {}: {}", name, e)))?;
    if value.is_empty() {
        return Err(Error::Identification(format!("DMI {} is empty", name)));
    }
    Ok(value)
}
