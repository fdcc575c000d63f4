//! Raw and classified input elements.
//!
//! A backend reports every signal a device exposes as a [`RawElement`]. The
//! classifier keeps the interesting ones as [`Element`]s, each split into an
//! immutable [`ElementDescriptor`] and a small mutable [`Calibration`] cell so
//! that sorting and identity never depend on the live range.

use std::ops::Deref;

/// HID usage pages and usages referenced by the classifier and the default matching rules.
pub mod usage {
    pub const PAGE_GENERIC_DESKTOP: u16 = 0x01;
    pub const PAGE_SIMULATION: u16 = 0x02;
    pub const PAGE_BUTTON: u16 = 0x09;
    pub const PAGE_CONSUMER: u16 = 0x0C;

    // Generic Desktop: device kinds
    pub const GD_JOYSTICK: u16 = 0x04;
    pub const GD_GAMEPAD: u16 = 0x05;
    pub const GD_MULTI_AXIS_CONTROLLER: u16 = 0x08;

    // Generic Desktop: controls
    pub const GD_X: u16 = 0x30;
    pub const GD_Y: u16 = 0x31;
    pub const GD_Z: u16 = 0x32;
    pub const GD_RX: u16 = 0x33;
    pub const GD_RY: u16 = 0x34;
    pub const GD_RZ: u16 = 0x35;
    pub const GD_SLIDER: u16 = 0x36;
    pub const GD_DIAL: u16 = 0x37;
    pub const GD_WHEEL: u16 = 0x38;
    pub const GD_HAT_SWITCH: u16 = 0x39;
    pub const GD_START: u16 = 0x3D;
    pub const GD_SELECT: u16 = 0x3E;
    pub const GD_SYSTEM_MAIN_MENU: u16 = 0x85;
    pub const GD_DPAD_UP: u16 = 0x90;
    pub const GD_DPAD_DOWN: u16 = 0x91;
    pub const GD_DPAD_RIGHT: u16 = 0x92;
    pub const GD_DPAD_LEFT: u16 = 0x93;

    // Simulation Controls
    pub const SIM_RUDDER: u16 = 0xBA;
    pub const SIM_THROTTLE: u16 = 0xBB;
    pub const SIM_ACCELERATOR: u16 = 0xC4;
    pub const SIM_BRAKE: u16 = 0xC5;
    pub const SIM_CLUTCH: u16 = 0xC6;
    pub const SIM_STEERING: u16 = 0xC8;
}

/// Element type tag as reported by the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    InputMisc,
    InputButton,
    InputAxis,
    InputScanCodes,
    InputNull,
    Output,
    Feature,
    Collection,
}

impl ElementType {
    /// Only axis, button and misc inputs are ever classified.
    #[inline]
    pub fn is_classifiable(self) -> bool {
        matches!(
            self,
            ElementType::InputAxis | ElementType::InputButton | ElementType::InputMisc
        )
    }
}

/// Opaque per-device element reference handed back to the backend on every value read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementCookie(pub u32);

/// One element exactly as the backend enumerated it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawElement {
    pub cookie: ElementCookie,
    pub kind: ElementType,
    pub usage_page: u16,
    pub usage: u16,
    pub logical_min: i64,
    pub logical_max: i64,
}

/// Immutable part of a classified element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementDescriptor {
    pub cookie: ElementCookie,
    pub usage_page: u16,
    pub usage: u16,
    /// Discovery position within its bucket, assigned before sorting.
    pub index: usize,
}

/// Observed raw value range of an element.
///
/// Starts at the logical range from the descriptor and only ever widens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Calibration {
    min: i64,
    max: i64,
}

impl Calibration {
    /// Seed from the descriptor's logical range.
    pub fn new(logical_min: i64, logical_max: i64) -> Self {
        Self {
            min: logical_min,
            max: logical_max,
        }
    }

    #[inline]
    pub fn min(&self) -> i64 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> i64 {
        self.max
    }

    /// Widen the range so that it contains `raw`.
    #[inline]
    pub fn observe(&mut self, raw: i64) {
        if raw < self.min {
            self.min = raw;
        }
        if raw > self.max {
            self.max = raw;
        }
    }

    /// Map `raw` into `[-1.0, 1.0]` using the current range. A zero-width range yields `0.0`.
    #[inline]
    pub fn normalize(&self, raw: i64) -> f64 {
        let range = self.max as f64 - self.min as f64;
        if range == 0.0 {
            return 0.0;
        }
        2.0 * (raw as f64 - self.min as f64) / range - 1.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub desc: ElementDescriptor,
    pub calibration: Calibration,
}

impl Element {
    #[inline]
    pub fn cookie(&self) -> ElementCookie {
        self.desc.cookie
    }

    #[inline]
    pub fn usage(&self) -> u16 {
        self.desc.usage
    }
}

/// Ordered bucket of elements (axes, buttons or hats of one device).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Elements(Vec<Element>);

impl Elements {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append `raw` with `index` set to the current bucket length.
    pub fn push_raw(&mut self, raw: &RawElement) {
        let index = self.0.len();
        self.0.push(Element {
            desc: ElementDescriptor {
                cookie: raw.cookie,
                usage_page: raw.usage_page,
                usage: raw.usage,
                index,
            },
            calibration: Calibration::new(raw.logical_min, raw.logical_max),
        });
    }

    /// Stable sort by `(usage, index)`.
    pub fn sort(&mut self) {
        self.0.sort_by_key(|e| (e.desc.usage, e.desc.index));
    }

    /// Mutable iteration, used by the sampler to widen calibration.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Element> {
        self.0.iter_mut()
    }
}

impl Deref for Elements {
    type Target = [Element];

    fn deref(&self) -> &[Element] {
        &self.0
    }
}
