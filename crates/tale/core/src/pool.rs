//! Recycling of retired action allocations.
//!
//! Finished top-level tasks are released here at the end of every frame.
//! [`ActionPool::acquire`] hands back a boxed slot of the same concrete type,
//! overwritten with the new value, so steady-state cutscenes stop allocating.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use tracing::debug;

use crate::{Action, Task};

/// Upper bound on pooled allocations per action type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolCapacity {
    Unlimited,
    Disabled,
    Limited(usize),
}

impl PoolCapacity {
    /// Interprets the integer knob: negative is unlimited, zero disables pooling.
    pub fn from_knob(value: i64) -> Self {
        match value {
            v if v < 0 => PoolCapacity::Unlimited,
            0 => PoolCapacity::Disabled,
            n => PoolCapacity::Limited(usize::try_from(n).unwrap_or(usize::MAX)),
        }
    }

    fn admits(self, pooled: usize) -> bool {
        match self {
            PoolCapacity::Unlimited => true,
            PoolCapacity::Disabled => false,
            PoolCapacity::Limited(max) => pooled < max,
        }
    }
}

impl Default for PoolCapacity {
    fn default() -> Self {
        PoolCapacity::Limited(4096)
    }
}

#[derive(Default)]
pub struct ActionPool {
    capacity: PoolCapacity,
    free: HashMap<TypeId, Vec<Box<dyn Any>>>,
    reused: u64,
    released: u64,
}

impl ActionPool {
    pub fn new(capacity: PoolCapacity) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn capacity(&self) -> PoolCapacity {
        self.capacity
    }

    /// Wraps `action` in a task, reusing a pooled allocation when one exists.
    pub fn acquire<A: Action>(&mut self, action: A) -> Task {
        let slot = self
            .free
            .get_mut(&TypeId::of::<A>())
            .and_then(Vec::pop)
            .and_then(|boxed| boxed.downcast::<A>().ok());

        match slot {
            Some(mut boxed) => {
                *boxed = action;
                self.reused += 1;
                Task::from_boxed(boxed)
            }
            None => Task::new(action),
        }
    }

    /// Takes a finished task's allocation. Returns `false` if it was dropped.
    ///
    /// Kept allocations are emptied through [`Action::recycle`] first, so a
    /// pooled composite does not keep its finished subtree alive.
    pub fn release(&mut self, task: Task) -> bool {
        let mut action = task.into_action();
        action.recycle();
        let action: Box<dyn Any> = action;
        let bucket = self.free.entry((*action).type_id()).or_default();

        if !self.capacity.admits(bucket.len()) {
            return false;
        }
        bucket.push(action);
        self.released += 1;
        true
    }

    /// Allocations currently waiting for reuse.
    pub fn pooled(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }

    pub fn reused(&self) -> u64 {
        self.reused
    }

    pub fn released(&self) -> u64 {
        self.released
    }

    pub fn clear(&mut self) {
        let dropped = self.pooled();
        self.free.clear();
        debug!(dropped, "action pool cleared");
    }
}
