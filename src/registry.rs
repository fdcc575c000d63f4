//! Gamepad registry.
//!
//! The hot-plug path only needs three operations from whoever owns the
//! gamepad records: `add`, `remove` and `find`, each keyed by predicate. The
//! default implementation, [`GamepadTable`], is an explicit handle table handed
//! to the [`Manager`](crate::manager::Manager) at construction.

use crate::gamepad::{Gamepad, GamepadId};
use crate::identity::Identifier;

/// Storage for gamepad records, owned by the [`Manager`](crate::manager::Manager)
/// and mutated only by the hot-plug coordinator and the sampling pass.
pub trait Registry: Send {
    /// Register a new logical gamepad and return it for the caller to attach native state.
    fn add(&mut self, name: &str, identifier: Identifier) -> &mut Gamepad;

    /// Remove the first gamepad matching `predicate`.
    fn remove(&mut self, predicate: &dyn Fn(&Gamepad) -> bool) -> Option<Gamepad>;

    /// Id of the first gamepad matching `predicate`.
    fn find(&self, predicate: &dyn Fn(&Gamepad) -> bool) -> Option<GamepadId>;

    /// Visit every gamepad (used by the sampling pass).
    fn for_each_mut(&mut self, f: &mut dyn FnMut(&mut Gamepad));

    fn for_each(&self, f: &mut dyn FnMut(&Gamepad));
}

#[derive(Debug, Default)]
pub struct GamepadTable {
    gamepads: Vec<Gamepad>,
    next_id: u32,
}

impl GamepadTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gamepad with `id`, if it is still registered.
    pub fn get(&self, id: GamepadId) -> Option<&Gamepad> {
        self.gamepads.iter().find(|g| g.id() == id)
    }

    /// Mutable access to the gamepad with `id`.
    pub fn get_mut(&mut self, id: GamepadId) -> Option<&mut Gamepad> {
        self.gamepads.iter_mut().find(|g| g.id() == id)
    }

    /// Gamepads in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Gamepad> {
        self.gamepads.iter()
    }

    /// Number of registered gamepads.
    pub fn len(&self) -> usize {
        self.gamepads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gamepads.is_empty()
    }
}

impl Registry for GamepadTable {
    fn add(&mut self, name: &str, identifier: Identifier) -> &mut Gamepad {
        let id = GamepadId(self.next_id);
        self.next_id += 1;
        self.gamepads.push(Gamepad::new(id, name, identifier));
        let last = self.gamepads.len() - 1;
        &mut self.gamepads[last]
    }

    fn remove(&mut self, predicate: &dyn Fn(&Gamepad) -> bool) -> Option<Gamepad> {
        let pos = self.gamepads.iter().position(|g| predicate(g))?;
        Some(self.gamepads.remove(pos))
    }

    fn find(&self, predicate: &dyn Fn(&Gamepad) -> bool) -> Option<GamepadId> {
        self.gamepads.iter().find(|g| predicate(g)).map(Gamepad::id)
    }

    fn for_each_mut(&mut self, f: &mut dyn FnMut(&mut Gamepad)) {
        self.gamepads.iter_mut().for_each(f);
    }

    fn for_each(&self, f: &mut dyn FnMut(&Gamepad)) {
        self.gamepads.iter().for_each(f);
    }
}
