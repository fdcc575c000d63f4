//! hidpad: gamepad backend over HID.
//!
//! Enumerates joystick/gamepad class devices, classifies their elements into
//! axes, buttons and hats, samples them with auto-calibration, and keeps a
//! registry of logical gamepads in sync with hot-plug events.
//!
//! ```no_run
//! # #[cfg(feature = "hid")]
//! # fn main() -> hidpad::Result<()> {
//! use hidpad::{Config, Manager};
//!
//! let mut mgr = Manager::discover(&Config::default())?;
//! loop {
//!     mgr.update();
//!     for g in mgr.registry().iter() {
//!         println!("{} X={:.2}", g.name(), g.axis_value(0));
//!     }
//! #   break;
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "hid"))]
//! # fn main() {}
//! ```

pub mod backends;
pub mod classify;
pub mod config;
pub mod device;
pub mod element;
pub mod error;
pub mod event;
pub mod gamepad;
pub mod hotplug;
pub mod identity;
pub mod manager;
pub mod metadata;
pub mod registry;
pub mod sampler;
pub mod snapshot;

pub use config::{Config, DeviceMatch};
pub use device::{Backend, NativeHandle, ValueSource};
pub use error::{Error, Result};
pub use event::{ChannelDesc, ChannelKind, HatState};
pub use gamepad::{Gamepad, GamepadId};
pub use identity::Identifier;
pub use manager::Manager;
pub use metadata::DeviceProperties;
pub use registry::{GamepadTable, Registry};
pub use snapshot::{GamepadState, Snapshot};
