//! Hot-plug coordination.
//!
//! Backends never touch the registry. Their event source posts
//! [`HotplugEvent`] messages through a [`HotplugSender`] (from any thread), and
//! the single [`HotplugCoordinator`] applies them, each under one registry
//! lock, so the polling side never sees a half-built record.
//!
//! Per device: `Unseen → Attached → Removed`. Attaching a handle that is
//! already registered and detaching an unknown handle are both no-ops.

use crate::classify::classify;
use crate::device::{NativeHandle, ValueSource};
use crate::element::RawElement;
use crate::gamepad::{GamepadId, NativeGamepad};
use crate::identity::Identifier;
use crate::metadata::DeviceProperties;
use crate::registry::Registry;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Notification from the platform event source.
pub enum HotplugEvent {
    Attached {
        handle: NativeHandle,
        properties: DeviceProperties,
        elements: Vec<RawElement>,
        source: Arc<dyn ValueSource>,
    },
    Detached {
        handle: NativeHandle,
    },
}

impl fmt::Debug for HotplugEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotplugEvent::Attached {
                handle,
                properties,
                elements,
                ..
            } => f
                .debug_struct("Attached")
                .field("handle", handle)
                .field("properties", properties)
                .field("elements", &elements.len())
                .finish(),
            HotplugEvent::Detached { handle } => {
                f.debug_struct("Detached").field("handle", handle).finish()
            }
        }
    }
}

/// What applying one event did to the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HotplugOutcome {
    Added(GamepadId),
    Removed(GamepadId),
    /// Duplicate attach or unknown detach.
    Ignored,
}

/// Cloneable producer side of the hot-plug queue.
#[derive(Clone, Debug)]
pub struct HotplugSender(Sender<HotplugEvent>);

impl HotplugSender {
    /// Post an event. Returns `false` if the coordinator is gone.
    pub fn send(&self, event: HotplugEvent) -> bool {
        self.0.send(event).is_ok()
    }

    pub fn attached(
        &self,
        handle: NativeHandle,
        properties: DeviceProperties,
        elements: Vec<RawElement>,
        source: Arc<dyn ValueSource>,
    ) -> bool {
        self.send(HotplugEvent::Attached {
            handle,
            properties,
            elements,
            source,
        })
    }

    pub fn detached(&self, handle: NativeHandle) -> bool {
        self.send(HotplugEvent::Detached { handle })
    }
}

/// Single consumer of hot-plug events; the only writer of registry membership.
pub struct HotplugCoordinator<R> {
    registry: Arc<Mutex<R>>,
    events: Receiver<HotplugEvent>,
}

impl<R: Registry> HotplugCoordinator<R> {
    pub fn new(registry: Arc<Mutex<R>>) -> (Self, HotplugSender) {
        let (tx, rx) = channel::unbounded();
        (
            Self {
                registry,
                events: rx,
            },
            HotplugSender(tx),
        )
    }

    /// Apply every queued event. Returns the number of events processed.
    pub fn drain(&self) -> usize {
        let mut n = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle(event);
            n += 1;
        }
        n
    }

    pub fn handle(&self, event: HotplugEvent) -> HotplugOutcome {
        match event {
            HotplugEvent::Attached {
                handle,
                properties,
                elements,
                source,
            } => self.attach(handle, &properties, &elements, source),
            HotplugEvent::Detached { handle } => self.detach(handle),
        }
    }

    fn attach(
        &self,
        handle: NativeHandle,
        properties: &DeviceProperties,
        elements: &[RawElement],
        source: Arc<dyn ValueSource>,
    ) -> HotplugOutcome {
        let mut registry = self.registry.lock();

        if let Some(existing) = registry.find(&|g| g.native_handle() == Some(handle)) {
            debug!(%handle, gamepad = %existing, "duplicate attach ignored");
            return HotplugOutcome::Ignored;
        }

        let name = properties.display_name();
        let identifier = Identifier::from_properties(properties);
        let native = NativeGamepad::new(handle, source, classify(elements));
        let (axes, buttons, hats) = (
            native.axes().len(),
            native.buttons().len(),
            native.hats().len(),
        );

        let gamepad = registry.add(name, identifier);
        gamepad.attach(native);
        let id = gamepad.id();

        info!(
            %handle,
            gamepad = %id,
            name,
            identifier = %gamepad.identifier(),
            vid = format_args!("{:#06x}", properties.vendor_id),
            pid = format_args!("{:#06x}", properties.product_id),
            axes,
            buttons,
            hats,
            "gamepad attached"
        );
        HotplugOutcome::Added(id)
    }

    fn detach(&self, handle: NativeHandle) -> HotplugOutcome {
        let mut registry = self.registry.lock();
        match registry.remove(&|g| g.native_handle() == Some(handle)) {
            Some(mut gamepad) => {
                gamepad.release();
                info!(%handle, gamepad = %gamepad.id(), name = gamepad.name(), "gamepad detached");
                HotplugOutcome::Removed(gamepad.id())
            }
            None => {
                debug!(%handle, "detach for unknown handle ignored");
                HotplugOutcome::Ignored
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::VirtualValues;
    use crate::element::{usage::*, ElementCookie, ElementType};
    use crate::registry::GamepadTable;

    fn xbox() -> DeviceProperties {
        DeviceProperties {
            name: Some("Xbox 360 Controller".into()),
            vendor_id: 0x045E,
            product_id: 0x028E,
            version: 0x0114,
            ..Default::default()
        }
    }

    fn elements() -> Vec<RawElement> {
        vec![
            RawElement {
                cookie: ElementCookie(0),
                kind: ElementType::InputMisc,
                usage_page: PAGE_GENERIC_DESKTOP,
                usage: GD_X,
                logical_min: 0,
                logical_max: 255,
            },
            RawElement {
                cookie: ElementCookie(1),
                kind: ElementType::InputButton,
                usage_page: PAGE_BUTTON,
                usage: 1,
                logical_min: 0,
                logical_max: 1,
            },
        ]
    }

    fn attach_event(handle: u64) -> HotplugEvent {
        HotplugEvent::Attached {
            handle: NativeHandle(handle),
            properties: xbox(),
            elements: elements(),
            source: Arc::new(VirtualValues::default()),
        }
    }

    fn setup() -> (HotplugCoordinator<GamepadTable>, HotplugSender, Arc<Mutex<GamepadTable>>) {
        let registry = Arc::new(Mutex::new(GamepadTable::new()));
        let (coord, tx) = HotplugCoordinator::new(registry.clone());
        (coord, tx, registry)
    }

    #[test]
    fn attach_registers_classified_gamepad() {
        let (coord, _tx, registry) = setup();
        let outcome = coord.handle(attach_event(1));
        let HotplugOutcome::Added(id) = outcome else {
            panic!("expected Added, got {outcome:?}");
        };

        let table = registry.lock();
        let g = table.get(id).unwrap();
        assert_eq!(g.name(), "Xbox 360 Controller");
        assert_eq!(g.identifier().as_str(), "030000005e0400008e02000014010000");
        assert_eq!(g.native_handle(), Some(NativeHandle(1)));
        assert!(g.present());
        let native = g.native().unwrap();
        assert_eq!(native.axes().len(), 1);
        assert_eq!(native.buttons().len(), 1);
        // Value buffers wait for the first sample.
        assert_eq!(g.axis_num(), 0);
    }

    #[test]
    fn duplicate_attach_is_a_noop() {
        let (coord, tx, registry) = setup();
        assert!(tx.send(attach_event(1)));
        assert!(tx.send(attach_event(1)));
        assert_eq!(coord.drain(), 2);
        assert_eq!(registry.lock().len(), 1);
        assert_eq!(coord.handle(attach_event(1)), HotplugOutcome::Ignored);
    }

    #[test]
    fn unknown_detach_leaves_registry_unchanged() {
        let (coord, _tx, registry) = setup();
        coord.handle(attach_event(1));
        let outcome = coord.handle(HotplugEvent::Detached {
            handle: NativeHandle(9),
        });
        assert_eq!(outcome, HotplugOutcome::Ignored);
        let table = registry.lock();
        assert_eq!(table.len(), 1);
        assert_eq!(table.iter().next().unwrap().native_handle(), Some(NativeHandle(1)));
    }

    #[test]
    fn detach_removes_and_reconnect_creates_fresh_record() {
        let (coord, tx, registry) = setup();
        let HotplugOutcome::Added(first) = coord.handle(attach_event(1)) else {
            panic!("attach failed");
        };
        assert!(tx.detached(NativeHandle(1)));
        coord.drain();
        assert!(registry.lock().is_empty());

        let HotplugOutcome::Added(second) = coord.handle(attach_event(2)) else {
            panic!("re-attach failed");
        };
        assert_ne!(first, second);
        let table = registry.lock();
        let g = table.get(second).unwrap();
        assert_eq!(g.identifier().as_str(), "030000005e0400008e02000014010000");
    }

    #[test]
    fn concurrent_producers_do_not_corrupt_registry() {
        let (coord, tx, registry) = setup();
        std::thread::scope(|s| {
            for t in 0..4u64 {
                let tx = tx.clone();
                s.spawn(move || {
                    for i in 0..25u64 {
                        let handle = t * 100 + i;
                        tx.send(attach_event(handle));
                        // Redelivery and a detach for every other device.
                        tx.send(attach_event(handle));
                        if i % 2 == 0 {
                            tx.detached(NativeHandle(handle));
                        }
                    }
                });
            }
            // Consume concurrently with the producers.
            for _ in 0..50 {
                coord.drain();
                std::thread::yield_now();
            }
        });
        coord.drain();

        let table = registry.lock();
        assert_eq!(table.len(), 4 * 12);
        let mut handles: Vec<u64> = table
            .iter()
            .filter_map(|g| g.native_handle())
            .map(|h| h.0)
            .collect();
        handles.sort_unstable();
        handles.dedup();
        assert_eq!(handles.len(), table.len());
        assert!(handles.iter().all(|h| (h % 100) % 2 == 1));
    }

    #[test]
    fn send_fails_once_coordinator_is_gone() {
        let (coord, tx, _registry) = setup();
        drop(coord);
        assert!(!tx.detached(NativeHandle(1)));
    }
}
