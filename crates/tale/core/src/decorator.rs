//! Decorator actions.
//!
//! A decorator wraps exactly one child and changes when or how it runs.

use std::fmt;

use crate::{Action, ActionResult, Frame, Task};

/// Starts its child after a delay in seconds.
///
/// The delay is checked before the clock advances, so the child first runs
/// on the frame after the delay elapsed. A zero delay starts it on the first
/// tick. Interrupting the decorator skips whatever is left of the delay.
pub struct Delayed {
    seconds: f32,
    clock: f32,
    child: Task,
}

impl Delayed {
    pub fn new(seconds: f32, child: Task) -> Self {
        Self {
            seconds,
            clock: 0.0,
            child,
        }
    }
}

impl Action for Delayed {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        if self.clock >= self.seconds {
            return self.child.execute(frame);
        }
        self.clock += frame.delta();
        Ok(false)
    }

    fn on_interrupt(&mut self, _frame: &mut Frame<'_>) {
        self.clock = self.seconds;
    }

    fn visit_subactions<'a>(&'a self, visit: &mut dyn FnMut(&'a Task)) {
        visit(&self.child);
    }

    fn visit_subactions_mut(&mut self, visit: &mut dyn FnMut(&mut Task)) {
        visit(&mut self.child);
    }

    fn recycle(&mut self) {
        self.child = Task::vacant();
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "Delayed ({:.2}/{:.2}s)", self.clock.min(self.seconds), self.seconds)
    }
}

/// Starts its child once a trigger has been seen.
///
/// The frame that sees the trigger only opens the gate; the child first runs
/// on the next tick, even though the trigger is gone by then.
pub struct DelayedBy {
    trigger: String,
    released: bool,
    child: Task,
}

impl DelayedBy {
    pub fn new(trigger: impl Into<String>, child: Task) -> Self {
        Self {
            trigger: trigger.into(),
            released: false,
            child,
        }
    }
}

impl Action for DelayedBy {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        if !self.released {
            self.released = frame.trigger(&self.trigger);
            return Ok(false);
        }
        self.child.execute(frame)
    }

    fn visit_subactions<'a>(&'a self, visit: &mut dyn FnMut(&'a Task)) {
        visit(&self.child);
    }

    fn visit_subactions_mut(&mut self, visit: &mut dyn FnMut(&mut Task)) {
        visit(&mut self.child);
    }

    fn recycle(&mut self) {
        self.child = Task::vacant();
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let state = if self.released { "running" } else { "waiting" };
        write!(out, "DelayedBy ({state}, {})", self.trigger)
    }
}

/// Runs its child until a trigger is visible, then interrupts it.
pub struct Interruptible {
    trigger: String,
    child: Task,
}

impl Interruptible {
    pub fn new(trigger: impl Into<String>, child: Task) -> Self {
        Self {
            trigger: trigger.into(),
            child,
        }
    }
}

impl Action for Interruptible {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        if frame.trigger(&self.trigger) {
            self.child.interrupt(frame);
            return Ok(true);
        }
        self.child.execute(frame)
    }

    fn visit_subactions<'a>(&'a self, visit: &mut dyn FnMut(&'a Task)) {
        visit(&self.child);
    }

    fn visit_subactions_mut(&mut self, visit: &mut dyn FnMut(&mut Task)) {
        visit(&mut self.child);
    }

    fn recycle(&mut self) {
        self.child = Task::vacant();
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "Interruptible ({})", self.trigger)
    }
}

/// Runs its child subtree on unscaled time.
pub struct Unscaled {
    child: Task,
}

impl Unscaled {
    pub fn new(child: Task) -> Self {
        Self { child }
    }
}

impl Action for Unscaled {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        self.child.execute(&mut frame.unscaled())
    }

    fn visit_subactions<'a>(&'a self, visit: &mut dyn FnMut(&'a Task)) {
        visit(&self.child);
    }

    fn visit_subactions_mut(&mut self, visit: &mut dyn FnMut(&mut Task)) {
        visit(&mut self.child);
    }

    fn recycle(&mut self) {
        self.child = Task::vacant();
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str("Unscaled")
    }
}
