//! Channel values and descriptions.
//!
//! ## Value conventions
//! - **Axes** are normalized to `[-1.0, 1.0]` against an auto-calibrated range.
//! - **Buttons** are `true` while the raw value is positive.
//! - **Hats** are a [`HatState`]; [`HatState::to_slot`] gives the `-1` / `0..7`
//!   slot convention (Up = 0, clockwise).

use serde::{Deserialize, Serialize};

/// Position of a hat switch (POV / D-pad).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HatState {
    #[default]
    Centered,
    Up,
    RightUp,
    Right,
    RightDown,
    Down,
    LeftDown,
    Left,
    LeftUp,
}

/// Raw hat values `0..7` in order, starting at Up and going clockwise.
const HAT_DIRECTIONS: [HatState; 8] = [
    HatState::Up,
    HatState::RightUp,
    HatState::Right,
    HatState::RightDown,
    HatState::Down,
    HatState::LeftDown,
    HatState::Left,
    HatState::LeftUp,
];

impl HatState {
    /// Decode a raw hat value. Anything outside `0..=7` (null states) is `Centered`.
    #[inline]
    pub fn from_raw(raw: i64) -> Self {
        usize::try_from(raw)
            .ok()
            .and_then(|i| HAT_DIRECTIONS.get(i).copied())
            .unwrap_or(HatState::Centered)
    }

    /// `-1` for centered, otherwise `0..7` (Up = 0, clockwise).
    pub fn to_slot(self) -> i16 {
        HAT_DIRECTIONS
            .iter()
            .position(|&d| d == self)
            .map_or(-1, |i| i as i16)
    }
}

/// Category of an input channel on a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Axis,
    Button,
    Hat,
}

/// Describes a channel exposed by a gamepad.
///
/// Built from the classified elements so UIs and tooling can present stable
/// names and ranges for each index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelDesc {
    pub kind: ChannelKind,
    /// Device-local index, as used by `axis_value` / `is_button_pressed` / `hat_state`.
    pub idx: usize,
    /// Human-friendly usage name (e.g. `"X"`, `"Button3"`, `"Hat"`).
    pub name: String,
    /// Current calibrated minimum (starts at the descriptor's logical minimum).
    pub min: i64,
    /// Current calibrated maximum (starts at the descriptor's logical maximum).
    pub max: i64,
    pub usage_page: u16,
    pub usage: u16,
}
