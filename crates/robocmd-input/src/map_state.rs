//! [`RemoteMapState`] – the input predicate a mapping is bound to.
//!
//! A map state matches a [`RemoteState`] snapshot when:
//!
//! - each switch is either `Unknown` (don't care) or in the required position,
//! - every required key is held,
//! - no negated key is held,
//! - every required mouse button is pressed.
//!
//! # Example
//!
//! ```
//! use robocmd_input::RemoteMapState;
//! use robocmd_types::{Key, RemoteState};
//!
//! // "G, but not Ctrl+G"
//! let state = RemoteMapState::new().keys([Key::G]).neg_keys([Key::Ctrl]);
//!
//! let mut remote = RemoteState::default();
//! remote.keys.insert(Key::G);
//! assert!(state.matches(&remote));
//!
//! remote.keys.insert(Key::Ctrl);
//! assert!(!state.matches(&remote));
//! ```

use std::fmt;

use robocmd_types::{Key, KeySet, MouseButton, RemoteState, Switch, SwitchState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RemoteMapState {
    left_switch: SwitchState,
    right_switch: SwitchState,
    keys: KeySet,
    neg_keys: KeySet,
    left_mouse: bool,
    right_mouse: bool,
}

impl RemoteMapState {
    /// A predicate with no constraints (matches every snapshot).
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single-switch predicate.
    pub fn switch(switch: Switch, position: SwitchState) -> Self {
        Self::new().with_switch(switch, position)
    }

    /// Shorthand for a single-mouse-button predicate.
    pub fn mouse(button: MouseButton) -> Self {
        Self::new().with_mouse(button)
    }

    pub fn with_switch(mut self, switch: Switch, position: SwitchState) -> Self {
        match switch {
            Switch::Left => self.left_switch = position,
            Switch::Right => self.right_switch = position,
        }
        self
    }

    /// Keys that must be held.  A key cannot be both required and negated;
    /// requiring it removes it from the negated set.
    pub fn keys(mut self, keys: impl IntoIterator<Item = Key>) -> Self {
        for key in keys {
            self.keys.insert(key);
        }
        self.neg_keys = self.neg_keys.difference(self.keys);
        self
    }

    /// Keys that must not be held.  Keys already required are ignored.
    pub fn neg_keys(mut self, keys: impl IntoIterator<Item = Key>) -> Self {
        for key in keys {
            self.neg_keys.insert(key);
        }
        self.neg_keys = self.neg_keys.difference(self.keys);
        self
    }

    pub fn with_mouse(mut self, button: MouseButton) -> Self {
        match button {
            MouseButton::Left => self.left_mouse = true,
            MouseButton::Right => self.right_mouse = true,
        }
        self
    }

    pub fn required_keys(&self) -> KeySet {
        self.keys
    }

    pub fn negated_keys(&self) -> KeySet {
        self.neg_keys
    }

    pub fn matches(&self, remote: &RemoteState) -> bool {
        let switch_ok = |wanted: SwitchState, actual: SwitchState| {
            wanted == SwitchState::Unknown || wanted == actual
        };
        switch_ok(self.left_switch, remote.left_switch)
            && switch_ok(self.right_switch, remote.right_switch)
            && self.keys.is_subset_of(remote.keys)
            && !self.neg_keys.intersects(remote.keys)
            && (!self.left_mouse || remote.left_mouse)
            && (!self.right_mouse || remote.right_mouse)
    }
}

impl fmt::Display for RemoteMapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.left_switch != SwitchState::Unknown {
            parts.push(format!("left={:?}", self.left_switch));
        }
        if self.right_switch != SwitchState::Unknown {
            parts.push(format!("right={:?}", self.right_switch));
        }
        if !self.keys.is_empty() {
            parts.push(format!("keys={:?}", self.keys.iter().collect::<Vec<_>>()));
        }
        if !self.neg_keys.is_empty() {
            parts.push(format!("not={:?}", self.neg_keys.iter().collect::<Vec<_>>()));
        }
        if self.left_mouse {
            parts.push("mouse=left".to_string());
        }
        if self.right_mouse {
            parts.push("mouse=right".to_string());
        }
        if parts.is_empty() {
            return write!(f, "<any>");
        }
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(keys: &[Key]) -> RemoteState {
        RemoteState {
            keys: keys.iter().copied().collect(),
            ..RemoteState::default()
        }
    }

    #[test]
    fn unknown_switch_is_dont_care() {
        let state = RemoteMapState::switch(Switch::Right, SwitchState::Up);
        let mut r = RemoteState::default();
        assert!(!state.matches(&r));
        r.right_switch = SwitchState::Up;
        r.left_switch = SwitchState::Down;
        assert!(state.matches(&r));
    }

    #[test]
    fn key_chord_requires_every_key() {
        let state = RemoteMapState::new().keys([Key::Ctrl, Key::G]);
        assert!(!state.matches(&remote(&[Key::G])));
        assert!(state.matches(&remote(&[Key::G, Key::Ctrl, Key::W])));
    }

    #[test]
    fn negated_keys_block_match() {
        let state = RemoteMapState::new().keys([Key::G]).neg_keys([Key::Ctrl, Key::Shift]);
        assert!(state.matches(&remote(&[Key::G])));
        assert!(!state.matches(&remote(&[Key::G, Key::Shift])));
    }

    #[test]
    fn required_key_cannot_be_negated() {
        let state = RemoteMapState::new().neg_keys([Key::G, Key::Ctrl]).keys([Key::G]);
        assert!(!state.negated_keys().contains(Key::G));
        assert!(state.negated_keys().contains(Key::Ctrl));
        assert!(state.matches(&remote(&[Key::G])));
    }

    #[test]
    fn mouse_button_requirement() {
        let state = RemoteMapState::mouse(MouseButton::Left);
        let mut r = RemoteState::default();
        assert!(!state.matches(&r));
        r.left_mouse = true;
        assert!(state.matches(&r));
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(RemoteMapState::new().to_string(), "<any>");
        let state = RemoteMapState::switch(Switch::Left, SwitchState::Up).keys([Key::F]);
        assert_eq!(state.to_string(), "left=Up keys=[F]");
    }
}
