use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::platform::PlatformRecord;
use crate::transport::acpi_call;

/// Top-level sensectl configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SensectlConfig {
    pub transport: TransportConfig,
    pub dispatch: DispatchConfig,
    /// Extra identification records, consulted before the built-in table.
    pub platform: Vec<PlatformRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// WMI method calls through the acpi_call kernel module.
    AcpiCall,
    /// In-memory firmware model, never touches hardware.
    Emulated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub kind: TransportKind,
    /// acpi_call control file.
    pub call_path: String,
    /// ACPI path of the WMI method object.
    pub acpi_method: String,
    /// WMI instance passed as the first method argument.
    pub instance: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::AcpiCall,
            call_path: format!("/{}", acpi_call::DEFAULT_CALL_PATH),
            acpi_method: acpi_call::DEFAULT_METHOD.to_string(),
            instance: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// How many times a write whose read-back mismatches is re-issued.
    pub verify_retries: u8,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { verify_retries: 1 }
    }
}

const SYSTEM_CONFIG: &str = "/etc/sensectl/config.toml";

/// `~/.config/sensectl/config.toml`
fn user_config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("sensectl").join("config.toml"))
}

/// A missing file is silent; an unparseable one is reported and skipped.
fn read_toml(path: &Path) -> Option<toml::Value> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content)
        .inspect_err(|e| warn!(path = %path.display(), error = %e, "ignoring unparseable config"))
        .ok()
}

/// Recursively merge two TOML values. Tables are merged key-by-key;
/// all other types (including `[[platform]]` arrays) in `overlay` replace `base`.
fn merge_values(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_values(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load config from a specific path, ignoring system/user files.
fn load_from_path(path: &Path) -> SensectlConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "invalid config, using defaults");
            SensectlConfig::default()
        }),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read config, using defaults");
            SensectlConfig::default()
        }
    }
}

/// Load the merged config: system defaults, then user overrides.
/// If `override_path` is provided, use only that file instead.
pub fn load(override_path: Option<&PathBuf>) -> SensectlConfig {
    if let Some(path) = override_path {
        return load_from_path(path);
    }

    let system = read_toml(Path::new(SYSTEM_CONFIG));
    let user = user_config_path().and_then(|p| read_toml(&p));

    let merged = match (system, user) {
        (Some(s), Some(u)) => Some(merge_values(s, u)),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    };

    match merged {
        Some(value) => value.try_into().unwrap_or_else(|e| {
            warn!(error = %e, "invalid merged config, using defaults");
            SensectlConfig::default()
        }),
        None => SensectlConfig::default(),
    }
}
