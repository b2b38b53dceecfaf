// Device inventory endpoint
//
// `GET /setup/devices` returns the gateway's full device list. The vendor
// payload carries far more than the bridge needs; only the fields consumed
// downstream are modeled, and all of them are required -- an element missing
// `label`, `deviceURL`, or `definition.uiClass` fails the whole call with a
// deserialization error instead of producing a half-parsed device.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::session::SessionClient;

/// Wire schema for one element of the `GET /setup/devices` response.
#[derive(Debug, Clone, Deserialize)]
pub struct SetupDevice {
    pub label: String,
    #[serde(rename = "deviceURL")]
    pub device_url: String,
    pub definition: Definition,
}

/// Nested `definition` object; `uiClass` is the device-type tag used for
/// filtering and bulk commands.
#[derive(Debug, Clone, Deserialize)]
pub struct Definition {
    #[serde(rename = "uiClass")]
    pub ui_class: String,
}

/// Flattened device record used across the bridge.
///
/// A value type: instances are replaced wholesale on each cache refresh,
/// never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub label: String,
    pub class: String,
    pub device_url: String,
}

impl From<SetupDevice> for Device {
    fn from(raw: SetupDevice) -> Self {
        Self {
            label: raw.label,
            class: raw.definition.ui_class,
            device_url: raw.device_url,
        }
    }
}

impl SessionClient {
    /// List all devices known to the gateway.
    ///
    /// `GET /setup/devices`
    pub async fn fetch_devices(&self) -> Result<Vec<Device>, Error> {
        let url = self.api_url("setup/devices")?;
        let raw: Vec<SetupDevice> = self.get_json(url).await?;
        Ok(raw.into_iter().map(Device::from).collect())
    }
}
