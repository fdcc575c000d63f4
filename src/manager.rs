//! Gamepad manager.
//!
//! [`Manager`] owns one [`Backend`], the [`HotplugCoordinator`] and the
//! registry. Construction opens the backend and runs one event pump, so devices
//! already connected are registered before the first [`update`](Manager::update).
//!
//! The backend can be pumped either inline from `update()` (default) or from a
//! dedicated thread ([`Manager::with_background_pump`]). Either way only the
//! coordinator writes registry membership, and sampling happens on the thread
//! that calls `update()`.

use crate::config::Config;
use crate::device::{Backend, NativeHandle};
use crate::error::{Error, Result};
use crate::event::ChannelDesc;
use crate::gamepad::{Gamepad, GamepadId};
use crate::hotplug::HotplugCoordinator;
use crate::identity::Identifier;
use crate::registry::{GamepadTable, Registry};
use crate::snapshot::{GamepadState, Snapshot};
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

enum EventSource {
    Inline(Box<dyn Backend>),
    Background(PumpThread),
}

struct PumpThread {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PumpThread {
    fn spawn(mut backend: Box<dyn Backend>, interval: Duration) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let handle = thread::Builder::new()
            .name("hidpad-pump".into())
            .spawn(move || {
                debug!(backend = backend.name(), "pump thread started");
                while !flag.load(Ordering::Relaxed) {
                    if let Err(e) = backend.pump() {
                        warn!(backend = backend.name(), error = %e, "event pump failed");
                    }
                    thread::sleep(interval);
                }
                debug!(backend = backend.name(), "pump thread stopped");
            })
            .map_err(Error::Spawn)?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for PumpThread {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("pump thread panicked");
            }
        }
    }
}

/// Diagnostic view of one registered gamepad, see [`Manager::report_json`].
#[derive(Debug, Serialize)]
pub struct DeviceReport {
    pub id: GamepadId,
    pub name: String,
    pub identifier: Identifier,
    pub present: bool,
    pub handle: Option<NativeHandle>,
    pub channels: Vec<ChannelDesc>,
}

impl DeviceReport {
    fn from_gamepad(g: &Gamepad) -> Self {
        Self {
            id: g.id(),
            name: g.name().to_string(),
            identifier: g.identifier().clone(),
            present: g.present(),
            handle: g.native_handle(),
            channels: g.describe(),
        }
    }
}

pub struct Manager<R: Registry = GamepadTable> {
    registry: Arc<Mutex<R>>,
    coordinator: HotplugCoordinator<R>,
    source: EventSource,
}

impl Manager<GamepadTable> {
    /// Open `backend` with the default [`GamepadTable`] registry.
    pub fn new<B: Backend + 'static>(backend: B, config: &Config) -> Result<Self> {
        Self::with_registry(backend, GamepadTable::new(), config)
    }

    /// Open the platform HID backend.
    #[cfg(feature = "hid")]
    pub fn discover(config: &Config) -> Result<Self> {
        Self::new(crate::backends::hid::HidBackend::new(config), config)
    }
}

impl<R: Registry + 'static> Manager<R> {
    pub fn with_registry<B: Backend + 'static>(
        backend: B,
        registry: R,
        config: &Config,
    ) -> Result<Self> {
        let (registry, coordinator, backend) = open(backend, registry, config)?;
        Ok(Self {
            registry,
            coordinator,
            source: EventSource::Inline(backend),
        })
    }

    /// Like [`Manager::with_registry`], but after the first pump the backend
    /// moves to a background thread that pumps every `config.pump_interval_ms`.
    /// The thread stops when the manager is dropped.
    pub fn with_background_pump<B: Backend + 'static>(
        backend: B,
        registry: R,
        config: &Config,
    ) -> Result<Self> {
        let (registry, coordinator, backend) = open(backend, registry, config)?;
        let interval = Duration::from_millis(config.pump_interval_ms);
        Ok(Self {
            registry,
            coordinator,
            source: EventSource::Background(PumpThread::spawn(backend, interval)?),
        })
    }

    /// Apply pending hot-plug events, then sample every gamepad once.
    pub fn update(&mut self) {
        if let EventSource::Inline(backend) = &mut self.source {
            if let Err(e) = backend.pump() {
                warn!(backend = backend.name(), error = %e, "event pump failed");
            }
        }
        self.coordinator.drain();
        self.registry.lock().for_each_mut(&mut |g| g.update());
    }

    /// Lock the registry for direct access to the gamepad records.
    pub fn registry(&self) -> MutexGuard<'_, R> {
        self.registry.lock()
    }

    /// Owned copy of every gamepad's values as of the last `update()`.
    pub fn snapshot(&self) -> Snapshot {
        let mut snap = Snapshot::default();
        self.registry.lock().for_each(&mut |g| {
            snap.0.insert(g.id(), GamepadState::capture(g));
        });
        snap
    }

    /// Pretty JSON listing of every gamepad and its channels.
    pub fn report_json(&self) -> Result<String> {
        let mut report = Vec::new();
        self.registry
            .lock()
            .for_each(&mut |g| report.push(DeviceReport::from_gamepad(g)));
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

/// Open the backend and register whatever is already connected.
#[allow(clippy::type_complexity)]
fn open<B, R>(
    mut backend: B,
    registry: R,
    config: &Config,
) -> Result<(Arc<Mutex<R>>, HotplugCoordinator<R>, Box<dyn Backend>)>
where
    B: Backend + 'static,
    R: Registry,
{
    config.validate()?;
    let registry = Arc::new(Mutex::new(registry));
    let (coordinator, events) = HotplugCoordinator::new(registry.clone());

    backend.open(&config.matching, events)?;
    backend.pump()?;
    let applied = coordinator.drain();
    info!(backend = backend.name(), events = applied, "manager ready");

    Ok((registry, coordinator, Box::new(backend)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::{VirtualBackend, VirtualDevice, VirtualHub};
    use crate::element::{usage::*, ElementCookie, ElementType, RawElement};
    use crate::event::HatState;
    use crate::metadata::DeviceProperties;
    use std::time::Instant;

    fn props() -> DeviceProperties {
        DeviceProperties {
            name: Some("Test Pad".into()),
            vendor_id: 0x1234,
            product_id: 0x5678,
            version: 1,
            ..Default::default()
        }
    }

    fn el(cookie: u32, kind: ElementType, page: u16, usage: u16, hi: i64) -> RawElement {
        RawElement {
            cookie: ElementCookie(cookie),
            kind,
            usage_page: page,
            usage,
            logical_min: 0,
            logical_max: hi,
        }
    }

    fn plug(hub: &VirtualHub) -> VirtualDevice {
        hub.plug(
            props(),
            vec![
                el(0, ElementType::InputMisc, PAGE_GENERIC_DESKTOP, GD_X, 255),
                el(1, ElementType::InputButton, PAGE_BUTTON, 1, 1),
                el(2, ElementType::InputMisc, PAGE_GENERIC_DESKTOP, GD_HAT_SWITCH, 7),
            ],
        )
    }

    #[test]
    fn connected_devices_are_registered_before_first_update() {
        let (backend, hub) = VirtualBackend::new();
        let _pad = plug(&hub);
        let mgr = Manager::new(backend, &Config::default()).unwrap();

        let table = mgr.registry();
        assert_eq!(table.len(), 1);
        let g = table.iter().next().unwrap();
        assert_eq!(g.name(), "Test Pad");
        assert_eq!(g.identifier().as_str(), "03000000341200007856000001000000");
        assert_eq!(g.axis_num(), 0);
    }

    #[test]
    fn update_samples_values() {
        let (backend, hub) = VirtualBackend::new();
        let pad = plug(&hub);
        let mut mgr = Manager::new(backend, &Config::default()).unwrap();

        pad.set(ElementCookie(0), 255);
        pad.set(ElementCookie(1), 1);
        pad.set(ElementCookie(2), 2);
        mgr.update();

        let snap = mgr.snapshot();
        let (_, state) = snap.iter().next().unwrap();
        assert_eq!(state.axes, vec![1.0]);
        assert_eq!(state.buttons, vec![true]);
        assert_eq!(state.hats, vec![HatState::Right]);
    }

    #[test]
    fn unreadable_values_reset_between_updates() {
        let (backend, hub) = VirtualBackend::new();
        let pad = plug(&hub);
        let mut mgr = Manager::new(backend, &Config::default()).unwrap();

        pad.set(ElementCookie(0), 0);
        pad.set(ElementCookie(1), 1);
        pad.set(ElementCookie(2), 4);
        mgr.update();
        let before = mgr.snapshot().into_inner().into_values().next().unwrap();
        assert_eq!(before.axes, vec![-1.0]);
        assert_eq!(before.buttons, vec![true]);
        assert_eq!(before.hats, vec![HatState::Down]);

        pad.clear(ElementCookie(0));
        pad.clear(ElementCookie(1));
        pad.clear(ElementCookie(2));
        mgr.update();
        let after = mgr.snapshot().into_inner().into_values().next().unwrap();
        assert_eq!(after.axes, vec![0.0]);
        assert_eq!(after.buttons, vec![false]);
        assert_eq!(after.hats, vec![HatState::Centered]);
    }

    #[test]
    fn unplug_and_redelivery() {
        let (backend, hub) = VirtualBackend::new();
        let pad = plug(&hub);
        let mut mgr = Manager::new(backend, &Config::default()).unwrap();

        pad.announce_again();
        mgr.update();
        assert_eq!(mgr.registry().len(), 1);

        pad.unplug();
        mgr.update();
        assert!(mgr.registry().is_empty());
        assert!(mgr.snapshot().is_empty());
    }

    #[test]
    fn empty_matching_is_rejected() {
        let (backend, _hub) = VirtualBackend::new();
        let config = Config {
            matching: Vec::new(),
            ..Config::default()
        };
        assert!(matches!(
            Manager::new(backend, &config),
            Err(Error::NoMatchCriteria)
        ));
    }

    #[test]
    fn report_lists_channels() {
        let (backend, hub) = VirtualBackend::new();
        let _pad = plug(&hub);
        let mut mgr = Manager::new(backend, &Config::default()).unwrap();
        mgr.update();

        let json: serde_json::Value = serde_json::from_str(&mgr.report_json().unwrap()).unwrap();
        let dev = &json[0];
        assert_eq!(dev["name"], "Test Pad");
        assert_eq!(dev["present"], true);
        assert_eq!(dev["channels"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn background_pump_picks_up_hotplug() {
        let (backend, hub) = VirtualBackend::new();
        let _first = plug(&hub);
        let config = Config {
            pump_interval_ms: 1,
            ..Config::default()
        };
        let mut mgr = Manager::with_background_pump(backend, GamepadTable::new(), &config).unwrap();
        assert_eq!(mgr.registry().len(), 1);

        let _second = plug(&hub);
        let deadline = Instant::now() + Duration::from_secs(5);
        while mgr.registry().len() < 2 && Instant::now() < deadline {
            mgr.update();
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(mgr.registry().len(), 2);
        drop(mgr);
    }
}
