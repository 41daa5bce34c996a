//! The assembled control surface: one dispatcher, one set of attributes,
//! bound to the platform resolved at startup.

use std::sync::Arc;

use tracing::{info, warn};

use crate::binding::battery::BatteryLimiter;
use crate::binding::fan::FanSpeed;
use crate::binding::keyboard::{FourZone, PerZone};
use crate::binding::logo::BackLogo;
use crate::binding::profile::{PlatformProfile, PlatformProfileChoices, ProfileChoices};
use crate::binding::{Attribute, Binding, FeatureStatus};
use crate::config::SensectlConfig;
use crate::dispatch::{Dispatcher, Transport};
use crate::error::{Error, Result};
use crate::platform::{self, Capabilities, HardwareIdentity, Platform};
use crate::sysfs::SysfsRoot;
use crate::transport;

pub struct Bridge {
    identity: Option<HardwareIdentity>,
    platform: Platform,
    dispatcher: Arc<Dispatcher>,
    attributes: Vec<Box<dyn Attribute>>,
}

impl Bridge {
    pub fn new(
        identity: Option<HardwareIdentity>,
        platform: Platform,
        transport: Box<dyn Transport>,
        verify_retries: u8,
    ) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(transport));
        let caps = platform.capabilities;
        let choices = ProfileChoices::new();

        let attributes: Vec<Box<dyn Attribute>> = vec![
            bind(PerZone, caps, &dispatcher, verify_retries),
            bind(FourZone, caps, &dispatcher, verify_retries),
            bind(BackLogo::new(caps), caps, &dispatcher, verify_retries),
            bind(
                FanSpeed::new(platform.fan_duty),
                caps,
                &dispatcher,
                verify_retries,
            ),
            bind(
                PlatformProfile::new(Arc::clone(&choices)),
                caps,
                &dispatcher,
                verify_retries,
            ),
            bind(
                PlatformProfileChoices::new(choices),
                caps,
                &dispatcher,
                verify_retries,
            ),
            bind(BatteryLimiter, caps, &dispatcher, verify_retries),
        ];

        info!(
            platform = %platform.name,
            capabilities = %caps,
            transport = %dispatcher.transport_name(),
            "bridge ready"
        );

        Self {
            identity,
            platform,
            dispatcher,
            attributes,
        }
    }

    /// Identify the machine under `sysfs`, resolve its platform against the
    /// configured and built-in records, and bind every attribute.
    ///
    /// An unreadable identity is not fatal: the bridge comes up with the
    /// minimal capability set.
    pub fn from_system(
        sysfs: &SysfsRoot,
        config: &SensectlConfig,
        transport: Box<dyn Transport>,
    ) -> Self {
        let identity = match platform::identify(sysfs) {
            Ok(id) => {
                if !id.is_acer() {
                    warn!(vendor = %id.vendor, "not an Acer machine");
                }
                Some(id)
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        };
        let platform = platform::resolve(identity.as_ref(), &config.platform);
        Self::new(
            identity,
            platform,
            transport,
            config.dispatch.verify_retries,
        )
    }

    /// Like [`Bridge::from_system`], opening the configured transport.
    pub fn open(sysfs: &SysfsRoot, config: &SensectlConfig) -> Self {
        let transport = transport::open(&config.transport, sysfs);
        Self::from_system(sysfs, config, transport)
    }

    pub fn identity(&self) -> Option<&HardwareIdentity> {
        self.identity.as_ref()
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn capabilities(&self) -> Capabilities {
        self.platform.capabilities
    }

    pub fn transport_name(&self) -> String {
        self.dispatcher.transport_name()
    }

    pub fn attributes(&self) -> impl Iterator<Item = &dyn Attribute> {
        self.attributes.iter().map(|a| a.as_ref())
    }

    pub fn attribute(&self, name: &str) -> Result<&dyn Attribute> {
        self.attributes()
            .find(|a| a.name() == name)
            .ok_or_else(|| Error::UnknownAttribute(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Result<String> {
        self.attribute(name)?.read()
    }

    pub fn set(&self, name: &str, text: &str) -> Result<()> {
        self.attribute(name)?.write(text)
    }

    pub fn status(&self, name: &str) -> Result<FeatureStatus> {
        Ok(self.attribute(name)?.status())
    }
}

fn bind<C: crate::binding::Control + 'static>(
    control: C,
    caps: Capabilities,
    dispatcher: &Arc<Dispatcher>,
    retries: u8,
) -> Box<dyn Attribute> {
    Box::new(Binding::new(control, caps, Arc::clone(dispatcher), retries))
}
