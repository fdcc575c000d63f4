//! Platform event sources for `hidpad`.
//!
//! Implementations of [`Backend`](crate::device::Backend). A backend enumerates
//! matching devices, announces attach/detach through the hot-plug queue, and
//! hands each attached device a [`ValueSource`](crate::device::ValueSource).
//!
//! # Feature flags
//! - **`hid`**: hidapi backend (default). Portable across Windows, macOS and Linux.
//! - **`virtual`**: in-process devices for demos and tests.

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod hid;

#[cfg(any(test, feature = "virtual"))]
#[cfg_attr(docsrs, doc(cfg(feature = "virtual")))]
pub mod virtual_input;
