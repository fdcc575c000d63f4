//! Seams to the platform HID subsystem.
//!
//! A [`Backend`] owns the OS session: it decides which devices match, and its
//! [`Backend::pump`] turns OS notifications into [`HotplugEvent`](crate::hotplug::HotplugEvent)s.
//! Each attached device comes with a [`ValueSource`] used by the sampler to read
//! raw element values.

use crate::config::DeviceMatch;
use crate::element::ElementCookie;
use crate::error::Result;
use crate::hotplug::HotplugSender;
use std::fmt;

/// Backend-assigned identity of one connected device.
///
/// Handles are never reused by a backend while it is open, so a reconnect
/// always shows up as a new handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct NativeHandle(pub u64);

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hid#{}", self.0)
    }
}

/// Per-device raw value access.
///
/// Implementations must never block on I/O for long; a value that cannot be
/// read right now is `None` and the sampler substitutes a default.
pub trait ValueSource: Send + Sync {
    /// Called once at the start of every sampling pass (e.g. to drain pending reports).
    fn begin_frame(&self) {}

    /// Latest raw integer value of `element`, or `None` if unreadable.
    fn value(&self, element: ElementCookie) -> Option<i64>;
}

/// Platform HID subsystem.
pub trait Backend: Send {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Establish the session and register interest in devices matching `matching`.
    ///
    /// Failure here is fatal to initialization; there is no degraded mode.
    fn open(&mut self, matching: &[DeviceMatch], events: HotplugSender) -> Result<()>;

    /// Run the event source once, delivering any pending attach/detach notifications.
    fn pump(&mut self) -> Result<()>;
}
