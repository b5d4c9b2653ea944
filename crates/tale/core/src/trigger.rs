//! Named one-frame signals.
//!
//! Triggers may be set from anywhere during a frame, and actions are ticked
//! in an order callers should not depend on. To keep every reader consistent,
//! a trigger set during frame N becomes visible during frame N + 1 only.

use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct Triggers {
    current: HashSet<String>,
    pending: HashSet<String>,
}

impl Triggers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises `name` for the next frame.
    pub fn set(&mut self, name: impl Into<String>) {
        self.pending.insert(name.into());
    }

    /// `true` if `name` was raised during the previous frame.
    pub fn get(&self, name: &str) -> bool {
        self.current.contains(name)
    }

    /// Like [`get`](Self::get), but also sees triggers raised this frame.
    pub fn get_immediate(&self, name: &str) -> bool {
        self.pending.contains(name) || self.get(name)
    }

    /// Triggers visible this frame.
    pub fn active(&self) -> impl Iterator<Item = &str> + '_ {
        self.current.iter().map(String::as_str)
    }

    /// Promotes pending triggers to current and starts an empty pending set.
    pub fn advance(&mut self) {
        std::mem::swap(&mut self.current, &mut self.pending);
        self.pending.clear();
    }

    pub fn clear(&mut self) {
        self.current.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_becomes_visible_next_frame_for_one_frame() {
        let mut triggers = Triggers::new();
        triggers.set("door");

        assert!(!triggers.get("door"));
        assert!(triggers.get_immediate("door"));

        triggers.advance();
        assert!(triggers.get("door"));
        assert_eq!(triggers.active().collect::<Vec<_>>(), vec!["door"]);

        triggers.advance();
        assert!(!triggers.get("door"));
        assert!(!triggers.get_immediate("door"));
    }

    #[test]
    fn clear_drops_both_buffers() {
        let mut triggers = Triggers::new();
        triggers.set("a");
        triggers.advance();
        triggers.set("b");
        triggers.clear();

        assert!(!triggers.get_immediate("a"));
        assert!(!triggers.get_immediate("b"));
    }
}
