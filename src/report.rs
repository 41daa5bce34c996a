use serde::Serialize;

use crate::binding::FeatureStatus;
use crate::bridge::Bridge;
use crate::platform::{Capability, Feature, HardwareIdentity};

/// Everything `sensectl status` shows, in a serializable form.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// sensectl version that produced this report
    pub version: String,
    pub timestamp: String,
    pub identity: Option<HardwareIdentity>,
    pub platform: String,
    pub capabilities: Vec<Capability>,
    pub transport: String,
    pub attributes: Vec<AttributeReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeReport {
    pub name: String,
    pub feature: Feature,
    pub writable: bool,
    pub status: FeatureStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusReport {
    /// Read every supported attribute. Read failures are recorded per
    /// attribute rather than aborting the report.
    pub fn collect(bridge: &Bridge) -> Self {
        let attributes = bridge
            .attributes()
            .map(|attr| {
                let (value, error) = if attr.status() == FeatureStatus::Unsupported {
                    (None, None)
                } else {
                    match attr.read() {
                        Ok(v) => (Some(v), None),
                        Err(e) => (None, Some(e.to_string())),
                    }
                };
                AttributeReport {
                    name: attr.name().to_string(),
                    feature: attr.feature(),
                    writable: attr.writable(),
                    status: attr.status(),
                    value,
                    error,
                }
            })
            .collect();

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            identity: bridge.identity().cloned(),
            platform: bridge.platform().name.clone(),
            capabilities: bridge.capabilities().iter().collect(),
            transport: bridge.transport_name(),
            attributes,
        }
    }
}
