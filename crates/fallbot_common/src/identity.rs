//! Device identity lookup.
//!
//! Consulted once per bootstrap to fill the `name` and `species` predicates.

use serde::{Deserialize, Serialize};

use crate::config::IdentityConfig;

/// Default device type when nothing is configured
pub const DEFAULT_DEVICE_TYPE: &str = "desktop";

/// Default name when neither config nor $HOSTNAME provide one
pub const DEFAULT_DEVICE_NAME: &str = "fallbot";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
}

/// Source of the running device's identity
pub trait IdentitySource: Send {
    fn identity(&self) -> DeviceIdentity;
}

/// Identity taken from the `[identity]` config section
#[derive(Debug, Clone)]
pub struct ConfiguredIdentity {
    name: Option<String>,
    device_type: Option<String>,
}

impl ConfiguredIdentity {
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            name: config.name.clone(),
            device_type: config.device_type.clone(),
        }
    }
}

impl IdentitySource for ConfiguredIdentity {
    fn identity(&self) -> DeviceIdentity {
        let name = self
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| std::env::var("HOSTNAME").ok().filter(|h| !h.is_empty()))
            .unwrap_or_else(|| DEFAULT_DEVICE_NAME.to_string());

        let device_type = self
            .device_type
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DEVICE_TYPE.to_string());

        DeviceIdentity { name, device_type }
    }
}

/// Fixed identity, handy for embedding and tests
impl IdentitySource for DeviceIdentity {
    fn identity(&self) -> DeviceIdentity {
        self.clone()
    }
}
