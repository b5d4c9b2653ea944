//! Per-tick context handed to [`Action::run`](super::Action::run).

use crate::{ActionPool, Flags, Triggers};

use super::{Action, ActionId, IdAllocator, Task};

/// Elapsed time for one frame, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct TimeStep {
    /// Scaled by the host's time scale.
    pub delta: f32,
    /// Wall-clock time, unaffected by the time scale.
    pub unscaled: f32,
}

impl TimeStep {
    pub const ZERO: Self = Self {
        delta: 0.0,
        unscaled: 0.0,
    };

    pub const fn new(delta: f32, unscaled: f32) -> Self {
        Self { delta, unscaled }
    }

    /// A step where scaled and unscaled time agree.
    pub const fn fixed(delta: f32) -> Self {
        Self::new(delta, delta)
    }
}

/// Work produced during a pass that the scheduler picks up at defined points.
#[derive(Default)]
pub(crate) struct Staging {
    pub(crate) queued: Vec<Task>,
    pub(crate) spawned: Vec<Task>,
    pub(crate) retired: Vec<Task>,
    pub(crate) cancelled: Vec<ActionId>,
}

impl Staging {
    pub(crate) fn is_empty(&self) -> bool {
        self.queued.is_empty()
            && self.spawned.is_empty()
            && self.retired.is_empty()
            && self.cancelled.is_empty()
    }
}

/// Scheduler state reachable from inside a frame.
#[derive(Default)]
pub(crate) struct FrameContext {
    pub(crate) triggers: Triggers,
    pub(crate) flags: Flags,
    pub(crate) staging: Staging,
    pub(crate) pool: ActionPool,
    pub(crate) ids: IdAllocator,
}

/// What an action sees while it runs.
///
/// Admission through a frame is staged. Queued tasks land behind the whole
/// queue once the queue pass ends; spawned tasks join the concurrent set
/// right after the action that spawned them returns.
pub struct Frame<'a> {
    step: TimeStep,
    use_unscaled: bool,
    ctx: &'a mut FrameContext,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(step: TimeStep, ctx: &'a mut FrameContext) -> Self {
        Self {
            step,
            use_unscaled: false,
            ctx,
        }
    }

    /// Seconds elapsed this frame, unscaled inside an [`Unscaled`](crate::Unscaled) subtree.
    #[inline]
    pub fn delta(&self) -> f32 {
        if self.use_unscaled {
            self.step.unscaled
        } else {
            self.step.delta
        }
    }

    /// `true` inside an [`Unscaled`](crate::Unscaled) subtree.
    #[inline]
    pub fn is_unscaled(&self) -> bool {
        self.use_unscaled
    }

    #[inline]
    pub fn unscaled_delta(&self) -> f32 {
        self.step.unscaled
    }

    #[inline]
    pub fn step(&self) -> TimeStep {
        self.step
    }

    /// Reborrows this frame with [`delta`](Self::delta) reporting unscaled time.
    pub fn unscaled(&mut self) -> Frame<'_> {
        Frame {
            step: self.step,
            use_unscaled: true,
            ctx: &mut *self.ctx,
        }
    }

    pub fn enqueue(&mut self, action: impl Action) -> ActionId {
        self.enqueue_task(Task::new(action))
    }

    pub fn enqueue_task(&mut self, mut task: Task) -> ActionId {
        let id = self.admit(&mut task);
        self.ctx.staging.queued.push(task);
        id
    }

    pub fn spawn(&mut self, action: impl Action) -> ActionId {
        self.spawn_task(Task::new(action))
    }

    pub fn spawn_task(&mut self, mut task: Task) -> ActionId {
        let id = self.admit(&mut task);
        self.ctx.staging.spawned.push(task);
        id
    }

    /// Spawns every task, keeping their order.
    pub fn spawn_all(&mut self, tasks: impl IntoIterator<Item = Task>) {
        for task in tasks {
            self.spawn_task(task);
        }
    }

    /// `true` if `name` was raised during the previous frame.
    pub fn trigger(&self, name: &str) -> bool {
        self.ctx.triggers.get(name)
    }

    /// Like [`trigger`](Self::trigger), but also sees triggers raised this frame.
    pub fn trigger_immediate(&self, name: &str) -> bool {
        self.ctx.triggers.get_immediate(name)
    }

    /// Raises `name`; readers see it on the next frame.
    pub fn set_trigger(&mut self, name: impl Into<String>) {
        self.ctx.triggers.set(name);
    }

    /// Current value of a flag, `0` if unset.
    pub fn flag(&self, name: &str) -> u64 {
        self.ctx.flags.get(name)
    }

    /// Flags change immediately, unlike triggers.
    pub fn set_flag(&mut self, name: impl Into<String>, value: u64) {
        self.ctx.flags.set(name, value);
    }

    pub fn increment_flag(&mut self, name: impl Into<String>, by: u64) {
        self.ctx.flags.increment(name, by);
    }

    pub fn remove_flag(&mut self, name: &str) -> Option<u64> {
        self.ctx.flags.remove(name)
    }

    /// Stops a top-level task, interrupting its subtree.
    ///
    /// The cancellation is applied at the scheduler's next flush point: right
    /// after the queue pass, or at the end of the frame when issued from the
    /// concurrent set. Ids that are no longer live are ignored.
    pub fn cancel(&mut self, id: ActionId) {
        self.ctx.staging.cancelled.push(id);
    }

    /// Builds a task, reusing a pooled allocation of the same action type.
    pub fn acquire<A: Action>(&mut self, action: A) -> Task {
        self.ctx.pool.acquire(action)
    }

    pub(crate) fn next_id(&mut self) -> ActionId {
        self.ctx.ids.next()
    }

    /// Hands a finished task back; it is recycled once the frame ends.
    pub(crate) fn retire(&mut self, task: Task) {
        debug_assert!(task.is_done(), "retired task {} is still live", task.id());
        self.ctx.staging.retired.push(task);
    }

    pub(crate) fn take_spawned(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.ctx.staging.spawned)
    }

    fn admit(&mut self, task: &mut Task) -> ActionId {
        if !task.id().is_assigned() {
            task.assign_id(self.ctx.ids.next());
        }
        if self.use_unscaled {
            task.mark_unscaled();
        }
        task.id()
    }
}
