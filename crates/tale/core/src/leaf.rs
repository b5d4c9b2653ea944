//! Leaf actions: timers, trigger waits, one-shot callbacks, flag writes and
//! tweens.

use std::fmt;

use crate::{Action, ActionId, ActionResult, Easing, Frame, Lerp};

/// Completes once `seconds` of frame time have elapsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Wait {
    seconds: f32,
    clock: f32,
}

impl Wait {
    pub fn new(seconds: f32) -> Self {
        Self {
            seconds,
            clock: 0.0,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.clock
    }
}

impl Action for Wait {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        self.clock += frame.delta();
        Ok(self.clock >= self.seconds)
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "Wait ({:.2}/{:.2}s)", self.clock, self.seconds)
    }
}

/// Completes on its `n`-th tick, independent of frame time.
///
/// `WaitTicks::new(0)` behaves like `new(1)`: every action runs at least once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitTicks {
    remaining: u32,
}

impl WaitTicks {
    pub fn new(ticks: u32) -> Self {
        Self {
            remaining: ticks.max(1),
        }
    }

    /// Ticks left before completion.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl Action for WaitTicks {
    fn run(&mut self, _frame: &mut Frame<'_>) -> ActionResult {
        self.remaining = self.remaining.saturating_sub(1);
        Ok(self.remaining == 0)
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "WaitTicks ({} left)", self.remaining)
    }
}

/// Completes on the frame a trigger is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitFor {
    trigger: String,
}

impl WaitFor {
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
        }
    }
}

impl Action for WaitFor {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        Ok(frame.trigger(&self.trigger))
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "WaitFor ({})", self.trigger)
    }
}

type Callback = Box<dyn FnOnce(&mut Frame<'_>)>;

/// Runs a callback once and completes.
///
/// The callback also fires if the action is interrupted before it ran, so
/// side effects scheduled through `Exec` are never silently skipped.
pub struct Exec {
    callback: Option<Callback>,
}

impl Exec {
    pub fn new(callback: impl FnOnce(&mut Frame<'_>) + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    fn fire(&mut self, frame: &mut Frame<'_>) {
        if let Some(callback) = self.callback.take() {
            callback(frame);
        }
    }
}

impl Action for Exec {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        self.fire(frame);
        Ok(true)
    }

    fn on_interrupt(&mut self, frame: &mut Frame<'_>) {
        self.fire(frame);
    }

    fn recycle(&mut self) {
        self.callback = None;
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str("Exec")
    }
}

/// Raises a trigger and completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetTrigger {
    trigger: String,
}

impl SetTrigger {
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
        }
    }
}

impl Action for SetTrigger {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        frame.set_trigger(self.trigger.clone());
        Ok(true)
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "SetTrigger ({})", self.trigger)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagWrite {
    Set(u64),
    Increment(u64),
}

/// Writes a flag and completes. The new value is visible to actions ticked
/// later in the same frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetFlag {
    flag: String,
    write: FlagWrite,
}

impl SetFlag {
    pub fn new(flag: impl Into<String>, value: u64) -> Self {
        Self {
            flag: flag.into(),
            write: FlagWrite::Set(value),
        }
    }

    pub fn increment(flag: impl Into<String>, by: u64) -> Self {
        Self {
            flag: flag.into(),
            write: FlagWrite::Increment(by),
        }
    }
}

impl Action for SetFlag {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        match self.write {
            FlagWrite::Set(value) => frame.set_flag(self.flag.clone(), value),
            FlagWrite::Increment(by) => frame.increment_flag(self.flag.clone(), by),
        }
        Ok(true)
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        match self.write {
            FlagWrite::Set(value) => write!(out, "SetFlag ({} = {value})", self.flag),
            FlagWrite::Increment(by) => write!(out, "SetFlag ({} += {by})", self.flag),
        }
    }
}

/// Cancels another top-level task and completes.
///
/// See [`Frame::cancel`] for when the cancellation lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stop {
    target: ActionId,
}

impl Stop {
    pub fn new(target: ActionId) -> Self {
        Self { target }
    }
}

impl Action for Stop {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        frame.cancel(self.target);
        Ok(true)
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "Stop ({})", self.target)
    }
}

/// Feeds an eased value from `from` to `to` into a callback every tick.
///
/// The clock advances by the frame delta and is clamped to `duration`; the
/// action completes on the tick the clock reaches it. A zero duration emits
/// `to` on the first tick. Interrupting emits the final value once.
pub struct Interpolate<T: Lerp> {
    from: T,
    to: T,
    duration: f32,
    easing: Easing,
    clock: f32,
    callback: Box<dyn FnMut(T)>,
}

impl<T: Lerp> Interpolate<T> {
    pub fn new(
        from: T,
        to: T,
        duration: f32,
        easing: Easing,
        callback: impl FnMut(T) + 'static,
    ) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            easing,
            clock: 0.0,
            callback: Box::new(callback),
        }
    }

    fn emit(&mut self) {
        let progress = if self.duration == 0.0 {
            1.0
        } else {
            self.clock / self.duration
        };
        let value = T::lerp(self.from, self.to, self.easing.apply(progress));
        (self.callback)(value);
    }
}

impl<T: Lerp> Action for Interpolate<T> {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        self.clock = (self.clock + frame.delta()).min(self.duration);
        self.emit();
        Ok(self.clock >= self.duration)
    }

    fn on_interrupt(&mut self, _frame: &mut Frame<'_>) {
        self.clock = self.duration;
        self.emit();
    }

    fn recycle(&mut self) {
        self.callback = Box::new(|_: T| {});
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "Interpolate ({:.2}/{:.2}s)", self.clock, self.duration)
    }
}
