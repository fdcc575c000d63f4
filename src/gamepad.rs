//! Gamepad records.
//!
//! [`NativeGamepad`] is the backend-facing state of one connected device: its
//! classified elements, the [`ValueSource`] they are read through, and the
//! value buffers filled by each sampling pass. [`Gamepad`] is the registry
//! record that owns it.
//!
//! All value accessors are total: an index beyond the current count, or a
//! device that has gone away, yields `0.0` / `false` / [`HatState::Centered`].

use crate::classify::{usage_name, Classified};
use crate::device::{NativeHandle, ValueSource};
use crate::element::Elements;
use crate::event::{ChannelDesc, ChannelKind, HatState};
use crate::identity::Identifier;
use crate::sampler::{sample_axes, sample_buttons, sample_hats, ValueBuffer};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Native state of one connected device.
///
/// Owns its classified elements exclusively. Value buffers are sized by each
/// [`update`](Self::update) and keep their allocation across polls.
pub struct NativeGamepad {
    handle: NativeHandle,
    source: Option<Arc<dyn ValueSource>>,

    axes: Elements,
    buttons: Elements,
    hats: Elements,

    axis_values: ValueBuffer<f64>,
    button_values: ValueBuffer<bool>,
    hat_values: ValueBuffer<HatState>,
}

impl NativeGamepad {
    /// Value buffers start empty and are populated by the first [`update`](Self::update).
    pub fn new(handle: NativeHandle, source: Arc<dyn ValueSource>, elements: Classified) -> Self {
        Self {
            handle,
            source: Some(source),
            axes: elements.axes,
            buttons: elements.buttons,
            hats: elements.hats,
            axis_values: ValueBuffer::new(),
            button_values: ValueBuffer::new(),
            hat_values: ValueBuffer::new(),
        }
    }

    #[inline]
    pub fn handle(&self) -> NativeHandle {
        self.handle
    }

    /// True until the device is released through the removal path.
    #[inline]
    pub fn present(&self) -> bool {
        self.source.is_some()
    }

    /// Drop the value source; subsequent samples resolve to defaults.
    pub(crate) fn release(&mut self) {
        self.source = None;
    }

    /// One sampling pass over every axis, button and hat.
    pub fn update(&mut self) {
        let Some(source) = self.source.as_deref() else {
            self.axis_values.set_len(self.axes.len());
            self.button_values.set_len(self.buttons.len());
            self.hat_values.set_len(self.hats.len());
            self.axis_values.clear_values();
            self.button_values.clear_values();
            self.hat_values.clear_values();
            return;
        };

        source.begin_frame();
        sample_axes(source, &mut self.axes, &mut self.axis_values);
        sample_buttons(source, &self.buttons, &mut self.button_values);
        sample_hats(source, &self.hats, &mut self.hat_values);
    }

    /// Number of axis values from the last sampling pass (0 before the first).
    pub fn axis_num(&self) -> usize {
        self.axis_values.len()
    }

    /// Number of button values from the last sampling pass.
    pub fn button_num(&self) -> usize {
        self.button_values.len()
    }

    /// Number of hat values from the last sampling pass.
    pub fn hat_num(&self) -> usize {
        self.hat_values.len()
    }

    /// Normalized axis value in `[-1.0, 1.0]`; `0.0` when `axis` is out of range.
    pub fn axis_value(&self, axis: usize) -> f64 {
        self.axis_values.get(axis).unwrap_or(0.0)
    }

    /// Whether `button` was pressed at the last pass; `false` when out of range.
    pub fn is_button_pressed(&self, button: usize) -> bool {
        self.button_values.get(button).unwrap_or(false)
    }

    /// Hat position at the last pass; `Centered` when `hat` is out of range.
    pub fn hat_state(&self, hat: usize) -> HatState {
        self.hat_values.get(hat).unwrap_or(HatState::Centered)
    }

    /// Classified axes, in index order, with their live calibration.
    pub fn axes(&self) -> &Elements {
        &self.axes
    }

    /// Classified buttons, in index order.
    pub fn buttons(&self) -> &Elements {
        &self.buttons
    }

    pub fn hats(&self) -> &Elements {
        &self.hats
    }

    /// Channel descriptions in index order: axes, then hats, then buttons.
    pub fn describe(&self) -> Vec<ChannelDesc> {
        let mut out = Vec::with_capacity(self.axes.len() + self.hats.len() + self.buttons.len());
        for (kind, bucket) in [
            (ChannelKind::Axis, &self.axes),
            (ChannelKind::Hat, &self.hats),
            (ChannelKind::Button, &self.buttons),
        ] {
            for (idx, el) in bucket.iter().enumerate() {
                out.push(ChannelDesc {
                    kind,
                    idx,
                    name: usage_name(el.desc.usage_page, el.desc.usage),
                    min: el.calibration.min(),
                    max: el.calibration.max(),
                    usage_page: el.desc.usage_page,
                    usage: el.desc.usage,
                });
            }
        }
        out
    }
}

impl fmt::Debug for NativeGamepad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeGamepad")
            .field("handle", &self.handle)
            .field("present", &self.present())
            .field("axes", &self.axes.len())
            .field("buttons", &self.buttons.len())
            .field("hats", &self.hats.len())
            .finish()
    }
}

/// Registry-assigned, user-visible gamepad id. Never reused within a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GamepadId(pub u32);

impl fmt::Display for GamepadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gamepad{}", self.0)
    }
}

/// One logical gamepad as held by a registry.
#[derive(Debug)]
pub struct Gamepad {
    id: GamepadId,
    name: String,
    identifier: Identifier,
    native: Option<NativeGamepad>,
}

impl Gamepad {
    pub fn new(id: GamepadId, name: impl Into<String>, identifier: Identifier) -> Self {
        Self {
            id,
            name: name.into(),
            identifier,
            native: None,
        }
    }

    /// Registry-assigned id.
    pub fn id(&self) -> GamepadId {
        self.id
    }

    /// Product name, or `"Unknown"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Controller-database identifier; stable across reconnects of the same model.
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Attach the backend state for this gamepad.
    pub fn attach(&mut self, native: NativeGamepad) {
        self.native = Some(native);
    }

    /// Native state, if a device has been attached.
    pub fn native(&self) -> Option<&NativeGamepad> {
        self.native.as_ref()
    }

    /// Backend handle of the attached device.
    pub fn native_handle(&self) -> Option<NativeHandle> {
        self.native.as_ref().map(NativeGamepad::handle)
    }

    /// Release the native device; the record stays but reports defaults from now on.
    pub fn release(&mut self) {
        if let Some(native) = self.native.as_mut() {
            native.release();
        }
    }

    /// True while a native device is attached and not released.
    pub fn present(&self) -> bool {
        self.native.as_ref().is_some_and(NativeGamepad::present)
    }

    /// Run one sampling pass; a record without native state does nothing.
    pub fn update(&mut self) {
        if let Some(native) = self.native.as_mut() {
            native.update();
        }
    }

    /// See [`NativeGamepad::axis_num`]; 0 without native state.
    pub fn axis_num(&self) -> usize {
        self.native.as_ref().map_or(0, NativeGamepad::axis_num)
    }

    pub fn button_num(&self) -> usize {
        self.native.as_ref().map_or(0, NativeGamepad::button_num)
    }

    pub fn hat_num(&self) -> usize {
        self.native.as_ref().map_or(0, NativeGamepad::hat_num)
    }

    /// See [`NativeGamepad::axis_value`].
    pub fn axis_value(&self, axis: usize) -> f64 {
        self.native.as_ref().map_or(0.0, |n| n.axis_value(axis))
    }

    pub fn is_button_pressed(&self, button: usize) -> bool {
        self.native
            .as_ref()
            .is_some_and(|n| n.is_button_pressed(button))
    }

    pub fn hat_state(&self, hat: usize) -> HatState {
        self.native
            .as_ref()
            .map_or(HatState::Centered, |n| n.hat_state(hat))
    }

    /// Channel descriptions, empty without native state.
    pub fn describe(&self) -> Vec<ChannelDesc> {
        self.native
            .as_ref()
            .map(NativeGamepad::describe)
            .unwrap_or_default()
    }
}
