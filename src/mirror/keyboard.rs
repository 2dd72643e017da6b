//! Key-repeat suppression for observer input

use std::collections::HashSet;

use crate::ws::protocol::Key;

/// Tracks held keys so that only real transitions are forwarded
#[derive(Debug, Default, Clone)]
pub struct KeyFilter {
    held: HashSet<Key>,
}

impl KeyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if this transition changes the held set and should be forwarded.
    /// Repeated keydowns and keyups for keys not held are dropped.
    pub fn transition(&mut self, pressed: bool, key: Key) -> bool {
        if pressed {
            self.held.insert(key)
        } else {
            self.held.remove(&key)
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }
}
