//! Remote input snapshot: switch positions, held keys, mouse buttons and
//! stick channels, sampled once per control tick.

use serde::{Deserialize, Serialize};

/// The two three-position switches on the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Switch {
    Left,
    Right,
}

/// Position of a remote switch. `Unknown` doubles as "don't care" in
/// mapping predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    #[default]
    Unknown,
    Down,
    Mid,
    Up,
}

/// Keyboard keys forwarded by the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Key {
    W = 0,
    S,
    A,
    D,
    Shift,
    Ctrl,
    Q,
    E,
    R,
    F,
    G,
    Z,
    X,
    C,
    V,
    B,
}

impl Key {
    pub const ALL: [Key; 16] = [
        Key::W,
        Key::S,
        Key::A,
        Key::D,
        Key::Shift,
        Key::Ctrl,
        Key::Q,
        Key::E,
        Key::R,
        Key::F,
        Key::G,
        Key::Z,
        Key::X,
        Key::C,
        Key::V,
        Key::B,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
}

/// A set of [`Key`]s stored as a bitmask.
///
/// Serialises as a list of key names so scenario files stay readable:
///
/// ```
/// use robocmd_types::{Key, KeySet};
///
/// let keys: KeySet = [Key::G, Key::Ctrl].into_iter().collect();
/// assert!(keys.contains(Key::Ctrl));
/// assert!(!keys.contains(Key::W));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Key>", into = "Vec<Key>")]
pub struct KeySet(u16);

impl KeySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn contains(self, key: Key) -> bool {
        self.0 & key.bit() != 0
    }

    pub fn insert(&mut self, key: Key) {
        self.0 |= key.bit();
    }

    pub fn remove(&mut self, key: Key) {
        self.0 &= !key.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `true` when every key in `self` is also in `other`.
    pub fn is_subset_of(self, other: KeySet) -> bool {
        self.0 & other.0 == self.0
    }

    pub fn intersects(self, other: KeySet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn difference(self, other: KeySet) -> KeySet {
        KeySet(self.0 & !other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = Key> {
        Key::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl FromIterator<Key> for KeySet {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        let mut set = KeySet::empty();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

impl From<Vec<Key>> for KeySet {
    fn from(keys: Vec<Key>) -> Self {
        keys.into_iter().collect()
    }
}

impl From<KeySet> for Vec<Key> {
    fn from(set: KeySet) -> Self {
        set.iter().collect()
    }
}

/// One sampled frame of operator input.
///
/// Stick channels are normalised to `[-1, 1]`; mouse deltas are raw counts.
/// Every field defaults so scenario files only list what they change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteState {
    pub left_switch: SwitchState,
    pub right_switch: SwitchState,
    pub keys: KeySet,
    pub left_mouse: bool,
    pub right_mouse: bool,
    pub left_horizontal: f32,
    pub left_vertical: f32,
    pub right_horizontal: f32,
    pub right_vertical: f32,
    pub mouse_x: i16,
    pub mouse_y: i16,
}

impl RemoteState {
    pub fn switch(&self, switch: Switch) -> SwitchState {
        match switch {
            Switch::Left => self.left_switch,
            Switch::Right => self.right_switch,
        }
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys.contains(key)
    }

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        match button {
            MouseButton::Left => self.left_mouse,
            MouseButton::Right => self.right_mouse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyset_insert_remove() {
        let mut set = KeySet::empty();
        assert!(set.is_empty());
        set.insert(Key::B);
        set.insert(Key::Ctrl);
        assert!(set.contains(Key::B));
        set.remove(Key::B);
        assert!(!set.contains(Key::B));
        assert!(set.contains(Key::Ctrl));
    }

    #[test]
    fn keyset_subset_and_intersection() {
        let chord: KeySet = [Key::G, Key::Ctrl].into_iter().collect();
        let held: KeySet = [Key::G, Key::Ctrl, Key::W].into_iter().collect();
        assert!(chord.is_subset_of(held));
        assert!(!held.is_subset_of(chord));
        assert!(chord.intersects(held));
        assert_eq!(held.difference(chord).iter().collect::<Vec<_>>(), vec![Key::W]);
    }

    #[test]
    fn keyset_serializes_as_names() {
        let set: KeySet = [Key::Ctrl, Key::W].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["W","CTRL"]"#);
    }

    #[test]
    fn remote_state_parses_sparse_toml() {
        let raw = r#"
            right_switch = "up"
            keys = ["F", "SHIFT"]
            left_mouse = true
        "#;
        let state: RemoteState = toml::from_str(raw).unwrap();
        assert_eq!(state.switch(Switch::Right), SwitchState::Up);
        assert_eq!(state.switch(Switch::Left), SwitchState::Unknown);
        assert!(state.key_pressed(Key::F));
        assert!(state.key_pressed(Key::Shift));
        assert!(state.mouse_pressed(MouseButton::Left));
        assert!(!state.mouse_pressed(MouseButton::Right));
    }
}
