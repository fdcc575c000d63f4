//! In-process virtual backend.
//!
//! [`VirtualBackend`] behaves like an OS event source: devices plugged through a
//! [`VirtualHub`] are only announced when the backend is pumped. Raw element
//! values are set directly on the per-device [`VirtualValues`].
//!
//! ```ignore
//! let (backend, hub) = VirtualBackend::new();
//! let pad = hub.plug(props, elements);
//! let mut mgr = Manager::new(backend, &Config::default())?;
//! pad.set(ElementCookie(0), 255);
//! mgr.update();
//! ```

use crate::config::DeviceMatch;
use crate::device::{Backend, NativeHandle, ValueSource};
use crate::element::{ElementCookie, RawElement};
use crate::error::{Error, Result};
use crate::hotplug::{HotplugEvent, HotplugSender};
use crate::metadata::DeviceProperties;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const BACKEND_NAME: &str = "virtual";

/// Raw element values of one virtual device. Unset elements are unreadable.
#[derive(Debug, Default)]
pub struct VirtualValues(Mutex<HashMap<ElementCookie, i64>>);

impl VirtualValues {
    /// Set the raw value of `element`.
    pub fn set(&self, element: ElementCookie, raw: i64) {
        self.0.lock().insert(element, raw);
    }

    /// Make `element` unreadable (simulates a transient read failure).
    pub fn clear(&self, element: ElementCookie) {
        self.0.lock().remove(&element);
    }
}

impl ValueSource for VirtualValues {
    fn value(&self, element: ElementCookie) -> Option<i64> {
        self.0.lock().get(&element).copied()
    }
}

#[derive(Clone)]
struct Plugged {
    properties: DeviceProperties,
    elements: Vec<RawElement>,
    values: Arc<VirtualValues>,
}

#[derive(Default)]
struct HubState {
    next_handle: u64,
    plugged: HashMap<NativeHandle, Plugged>,
    pending: Vec<HotplugEvent>,
}

/// Test/demo handle for plugging and unplugging virtual devices.
#[derive(Clone, Default)]
pub struct VirtualHub(Arc<Mutex<HubState>>);

impl VirtualHub {
    /// Plug a device. It is announced on the backend's next pump.
    pub fn plug(&self, properties: DeviceProperties, elements: Vec<RawElement>) -> VirtualDevice {
        let mut state = self.0.lock();
        let handle = NativeHandle(state.next_handle);
        state.next_handle += 1;

        let plugged = Plugged {
            properties,
            elements,
            values: Arc::new(VirtualValues::default()),
        };
        state.pending.push(attach_event(handle, &plugged));
        let values = plugged.values.clone();
        state.plugged.insert(handle, plugged);

        VirtualDevice {
            hub: self.clone(),
            handle,
            values,
        }
    }

    /// Number of devices currently plugged.
    pub fn plugged(&self) -> usize {
        self.0.lock().plugged.len()
    }
}

fn attach_event(handle: NativeHandle, plugged: &Plugged) -> HotplugEvent {
    HotplugEvent::Attached {
        handle,
        properties: plugged.properties.clone(),
        elements: plugged.elements.clone(),
        source: plugged.values.clone(),
    }
}

/// A plugged virtual device.
#[derive(Clone)]
pub struct VirtualDevice {
    hub: VirtualHub,
    handle: NativeHandle,
    values: Arc<VirtualValues>,
}

impl VirtualDevice {
    /// Handle announced for this device.
    pub fn handle(&self) -> NativeHandle {
        self.handle
    }

    /// Set the raw value of `element`; read on the next sampling pass.
    pub fn set(&self, element: ElementCookie, raw: i64) {
        self.values.set(element, raw);
    }

    /// Make `element` unreadable from the next sampling pass on.
    pub fn clear(&self, element: ElementCookie) {
        self.values.clear(element);
    }

    /// Queue another attach notification for this device (OS redelivery).
    pub fn announce_again(&self) {
        let mut state = self.hub.0.lock();
        if let Some(plugged) = state.plugged.get(&self.handle).cloned() {
            state.pending.push(attach_event(self.handle, &plugged));
        }
    }

    /// Unplug the device. The detach is announced on the backend's next pump.
    pub fn unplug(self) {
        let mut state = self.hub.0.lock();
        if state.plugged.remove(&self.handle).is_some() {
            state.pending.push(HotplugEvent::Detached {
                handle: self.handle,
            });
        }
    }
}

/// [`Backend`] delivering the hub's queued attach/detach events on each pump.
pub struct VirtualBackend {
    hub: VirtualHub,
    events: Option<HotplugSender>,
}

impl VirtualBackend {
    pub fn new() -> (Self, VirtualHub) {
        let hub = VirtualHub::default();
        (
            Self {
                hub: hub.clone(),
                events: None,
            },
            hub,
        )
    }
}

impl Backend for VirtualBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn open(&mut self, matching: &[DeviceMatch], events: HotplugSender) -> Result<()> {
        if self.events.is_some() {
            return Err(Error::AlreadyOpen(BACKEND_NAME));
        }
        if matching.is_empty() {
            return Err(Error::NoMatchCriteria);
        }
        self.events = Some(events);
        Ok(())
    }

    fn pump(&mut self) -> Result<()> {
        let events = self.events.as_ref().ok_or(Error::NotOpen(BACKEND_NAME))?;
        let pending = std::mem::take(&mut self.hub.0.lock().pending);
        for event in pending {
            events.send(event);
        }
        Ok(())
    }
}
