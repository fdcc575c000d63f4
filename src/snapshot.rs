//! Per-frame snapshot of gamepad states.
//!
//! [`Snapshot`] is an **owned**, read-only view of every registered gamepad at
//! a point in time (typically "this frame"). It's produced by
//! [`Manager::snapshot`](crate::manager::Manager::snapshot) and is cheap to clone
//! for fan-out to multiple consumers.
//!
//! # Semantics
//! - Keys are [`GamepadId`]s, ordered by registration.
//! - Values copy the logical value buffers as of the last `update()`.
//! - `Snapshot` does **not** sample devices; call `Manager::update` first.
//!
//! # Examples
//! ```no_run
//! use hidpad::Snapshot;
//!
//! fn print_sticks(snap: &Snapshot) {
//!     for (id, state) in snap.iter() {
//!         let x = state.axes.first().copied().unwrap_or_default();
//!         let y = state.axes.get(1).copied().unwrap_or_default();
//!         println!("{id} {}: X={x:.2} Y={y:.2}", state.name);
//!     }
//! }
//! ```

use crate::event::HatState;
use crate::gamepad::{Gamepad, GamepadId};
use crate::identity::Identifier;
use serde::Serialize;
use std::collections::BTreeMap;

/// Values of one gamepad, indexed like the live accessors.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GamepadState {
    pub name: String,
    pub identifier: Identifier,
    pub axes: Vec<f64>,
    pub buttons: Vec<bool>,
    pub hats: Vec<HatState>,
}

impl GamepadState {
    /// Copy the values `gamepad` reported at its last sampling pass.
    pub fn capture(gamepad: &Gamepad) -> Self {
        Self {
            name: gamepad.name().to_string(),
            identifier: gamepad.identifier().clone(),
            axes: (0..gamepad.axis_num()).map(|i| gamepad.axis_value(i)).collect(),
            buttons: (0..gamepad.button_num())
                .map(|i| gamepad.is_button_pressed(i))
                .collect(),
            hats: (0..gamepad.hat_num()).map(|i| gamepad.hat_state(i)).collect(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Snapshot(pub BTreeMap<GamepadId, GamepadState>);

impl Snapshot {
    #[inline]
    pub fn get(&self, id: GamepadId) -> Option<&GamepadState> {
        self.0.get(&id)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&GamepadId, &GamepadState)> {
        self.0.iter()
    }

    /// Number of gamepads captured.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the snapshot and return the inner map.
    #[inline]
    pub fn into_inner(self) -> BTreeMap<GamepadId, GamepadState> {
        self.0
    }
}
