//! Runtime configuration.
//!
//! Configuration is plain TOML; every key is optional.
//!
//! ```toml
//! pump_interval_ms = 8
//! max_reports_per_tick = 32
//!
//! [[matching]]
//! usage_page = 0x01
//! usage = 0x05
//! ```

use crate::element::usage;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One device matching criterion: a top-level HID `(usage_page, usage)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceMatch {
    pub usage_page: u16,
    pub usage: u16,
}

impl DeviceMatch {
    pub const fn new(usage_page: u16, usage: u16) -> Self {
        Self { usage_page, usage }
    }

    /// Whether a device reporting this top-level usage should be picked up.
    #[inline]
    pub fn matches(&self, usage_page: u16, usage: u16) -> bool {
        self.usage_page == usage_page && self.usage == usage
    }
}

/// Joystick, GamePad and Multi-axis Controller on the Generic Desktop page.
pub fn default_matching() -> Vec<DeviceMatch> {
    vec![
        DeviceMatch::new(usage::PAGE_GENERIC_DESKTOP, usage::GD_JOYSTICK),
        DeviceMatch::new(usage::PAGE_GENERIC_DESKTOP, usage::GD_GAMEPAD),
        DeviceMatch::new(usage::PAGE_GENERIC_DESKTOP, usage::GD_MULTI_AXIS_CONTROLLER),
    ]
}

fn default_pump_interval_ms() -> u64 {
    8
}

fn default_max_reports_per_tick() -> usize {
    32
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Devices are only attached when their top-level usage matches one of these.
    #[serde(default = "default_matching")]
    pub matching: Vec<DeviceMatch>,

    /// Sleep between event pumps when the pump runs on a background thread.
    #[serde(default = "default_pump_interval_ms")]
    pub pump_interval_ms: u64,

    /// Safety valve: maximum number of input reports drained per device per sampling pass.
    #[serde(default = "default_max_reports_per_tick")]
    pub max_reports_per_tick: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            matching: default_matching(),
            pump_interval_ms: default_pump_interval_ms(),
            max_reports_per_tick: default_max_reports_per_tick(),
        }
    }
}

impl Config {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(s)?;
        Ok(cfg)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject configurations that could never attach a device.
    pub fn validate(&self) -> Result<()> {
        if self.matching.is_empty() {
            return Err(Error::NoMatchCriteria);
        }
        Ok(())
    }
}
