//! Device properties.
//!
//! [`DeviceProperties`] is what a backend knows about a device at attach time.
//! `vendor_id`/`product_id`/`version` feed the [`Identifier`](crate::identity::Identifier);
//! zero means "not reported". The remaining fields are diagnostic only.
//!
//! ## Persistence notes
//! - `vendor_id`/`product_id`/`version` are stable across reconnects and runs.
//! - `path` is platform-specific and may change across ports and reconnects;
//!   treat it as diagnostic first, identity never.

use serde::{Deserialize, Serialize};

/// Name used when the device does not report a product string.
pub const UNKNOWN_NAME: &str = "Unknown";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProperties {
    /// Product string from the driver/firmware, if any.
    pub name: Option<String>,

    /// USB Vendor ID, `0` if unknown.
    pub vendor_id: u16,

    /// USB Product ID, `0` if unknown.
    pub product_id: u16,

    /// Device release/version number, `0` if unknown.
    pub version: u16,

    /// OS/topological path to the device.
    pub path: Option<String>,

    /// Top-level HID usage page (e.g. `0x01` for Generic Desktop).
    pub usage_page: Option<u16>,

    /// Top-level HID usage within the page (e.g. `0x05` GamePad).
    pub usage: Option<u16>,
}

impl DeviceProperties {
    /// Product string, or [`UNKNOWN_NAME`].
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_NAME)
    }
}
