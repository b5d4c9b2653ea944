//! Builder utilities for ergonomic cutscene construction.
//!
//! Instead of writing `Task::new(Multiplex::new(vec![Task::new(Wait::new(1.0)), ...]))`,
//! compose with shorter functions:
//!
//! ```
//! use tale_core::builder::{multiplex, wait, exec};
//!
//! let intro = multiplex(vec![wait(1.5), exec(|_| println!("lights"))]);
//! assert_eq!(intro.to_string(), "Multiplex (2/2)");
//! ```

use crate::composite::{Any, Bind, Branch, Multiplex, Parallel, ParallelQueue, Repeat};
use crate::decorator::{Delayed, DelayedBy, Interruptible, Unscaled};
use crate::leaf::{Exec, Interpolate, SetFlag, SetTrigger, Stop, Wait, WaitFor, WaitTicks};
use crate::scheduler::SequentialQueue;
use crate::{ActionId, Easing, Frame, Lerp, Task};

#[inline]
pub fn wait(seconds: f32) -> Task {
    Task::new(Wait::new(seconds))
}

#[inline]
pub fn wait_ticks(ticks: u32) -> Task {
    Task::new(WaitTicks::new(ticks))
}

#[inline]
pub fn wait_for(trigger: impl Into<String>) -> Task {
    Task::new(WaitFor::new(trigger))
}

#[inline]
pub fn exec(callback: impl FnOnce(&mut Frame<'_>) + 'static) -> Task {
    Task::new(Exec::new(callback))
}

#[inline]
pub fn set_trigger(trigger: impl Into<String>) -> Task {
    Task::new(SetTrigger::new(trigger))
}

#[inline]
pub fn set_flag(flag: impl Into<String>, value: u64) -> Task {
    Task::new(SetFlag::new(flag, value))
}

#[inline]
pub fn increment_flag(flag: impl Into<String>, by: u64) -> Task {
    Task::new(SetFlag::increment(flag, by))
}

/// Cancels the top-level task `target` when reached.
#[inline]
pub fn stop(target: ActionId) -> Task {
    Task::new(Stop::new(target))
}

#[inline]
pub fn interpolate<T: Lerp>(
    from: T,
    to: T,
    duration: f32,
    easing: Easing,
    callback: impl FnMut(T) + 'static,
) -> Task {
    Task::new(Interpolate::new(from, to, duration, easing, callback))
}

/// Shorthand for `Task::new(Multiplex::new(children))`.
#[inline]
pub fn multiplex(children: Vec<Task>) -> Task {
    Task::new(Multiplex::new(children))
}

/// Shorthand for `Task::new(Parallel::new(children))`.
#[inline]
pub fn parallel(children: Vec<Task>) -> Task {
    Task::new(Parallel::new(children))
}

#[inline]
pub fn parallel_queue(children: Vec<Task>) -> Task {
    Task::new(ParallelQueue::new(children))
}

/// A nested queue running `children` one after another.
#[inline]
pub fn queue(children: Vec<Task>) -> Task {
    Task::new(SequentialQueue::from_tasks(children))
}

#[inline]
pub fn any(children: Vec<Task>) -> Task {
    Task::new(Any::new(children))
}

#[inline]
pub fn bind(primary: Task, secondary: Task) -> Task {
    Task::new(Bind::new(primary, secondary))
}

#[inline]
pub fn repeat(count: u64, factory: impl FnMut() -> Vec<Task> + 'static) -> Task {
    Task::new(Repeat::new(count, factory))
}

#[inline]
pub fn repeat_forever(factory: impl FnMut() -> Vec<Task> + 'static) -> Task {
    Task::new(Repeat::forever(factory))
}

/// Picks a child from the flag's value on the first tick.
#[inline]
pub fn branch(
    flag: impl Into<String>,
    selector: impl FnOnce(u64) -> Option<Task> + 'static,
) -> Task {
    Task::new(Branch::new(flag, selector))
}

#[inline]
pub fn delayed(seconds: f32, child: Task) -> Task {
    Task::new(Delayed::new(seconds, child))
}

#[inline]
pub fn delayed_by(trigger: impl Into<String>, child: Task) -> Task {
    Task::new(DelayedBy::new(trigger, child))
}

#[inline]
pub fn interruptible(trigger: impl Into<String>, child: Task) -> Task {
    Task::new(Interruptible::new(trigger, child))
}

#[inline]
pub fn unscaled(child: Task) -> Task {
    Task::new(Unscaled::new(child))
}
