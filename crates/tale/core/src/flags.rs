//! Named counters that outlive a single frame.
//!
//! Unlike [`Triggers`](crate::Triggers), flags are visible immediately and
//! persist until removed. Cutscenes use them for narrative state such as
//! choices taken or how often a line was heard.

use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct Flags {
    entries: HashMap<String, u64>,
}

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: u64) {
        self.entries.insert(name.into(), value);
    }

    /// Adds `by` to the flag, starting from `0` if unset. Saturates at `u64::MAX`.
    pub fn increment(&mut self, name: impl Into<String>, by: u64) -> u64 {
        let value = self.entries.entry(name.into()).or_default();
        *value = value.saturating_add(by);
        *value
    }

    /// Current value, `0` if the flag was never set.
    pub fn get(&self, name: &str) -> u64 {
        self.entries.get(name).copied().unwrap_or(0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<u64> {
        self.entries.remove(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
