//! Cooperative, frame-driven action scheduler for cutscenes and scripted sequences.
//!
//! Narrative work is expressed as [`Action`]s: small pollable units that are
//! ticked once per frame until they report completion. A [`Scheduler`] owns
//! two containers and drives them from the host's frame loop:
//!
//! - **Sequential queue**: FIFO stream where only the front action runs
//! - **Concurrent set**: unordered set where every action runs each frame
//!
//! Composites ([`composite`]) and decorators ([`decorator`]) combine actions
//! into trees; [`builder`] offers shorthand constructors for both.
//!
//! Everything is single-threaded and allocation-conscious. Containers keep
//! power-of-two capacities and only shrink when asked to ([`Scheduler::vacuum`]),
//! and finished actions are recycled through a per-type [`ActionPool`].
//!
//! # Example
//!
//! ```
//! use tale_core::builder::{multiplex, wait_ticks};
//! use tale_core::{Scheduler, TimeStep};
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.enqueue_task(multiplex(vec![wait_ticks(1), wait_ticks(2)]));
//!
//! let step = TimeStep::fixed(1.0 / 60.0);
//! assert!(!scheduler.tick_frame(step)?.is_idle());
//! assert!(scheduler.tick_frame(step)?.is_idle());
//! # Ok::<(), tale_core::ActionError>(())
//! ```

pub mod action;
pub mod builder;
pub mod collections;
pub mod composite;
pub mod config;
pub mod decorator;
pub mod easing;
pub mod flags;
pub mod leaf;
pub mod pool;
pub mod scheduler;
pub mod trigger;

pub use action::{
    Action, ActionError, ActionId, ActionResult, ExecutionState, Frame, Task, TimeStep,
};
pub use config::{ConfigError, ContainerConfig, PoolConfig, SchedulerConfig};
pub use pool::{ActionPool, PoolCapacity};
pub use scheduler::{
    ActionInfo, ConcurrentSet, FrameReport, Lane, ReclaimError, Scheduler, SequentialQueue,
    Snapshot, Stats, VacuumReport,
};
pub use easing::{Easing, Lerp};
pub use flags::Flags;
pub use trigger::Triggers;

pub use composite::{Any, Bind, Branch, Multiplex, Parallel, ParallelQueue, Repeat};
pub use decorator::{Delayed, DelayedBy, Interruptible, Unscaled};
pub use leaf::{Exec, Interpolate, SetFlag, SetTrigger, Stop, Wait, WaitFor, WaitTicks};

pub(crate) use action::FrameContext;
