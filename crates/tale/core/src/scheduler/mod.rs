//! The scheduler: a sequential queue and a concurrent set driven once per frame.
//!
//! Each [`Scheduler::tick_frame`] runs, in order:
//!
//! 1. the queue pass: the queue front is ticked once
//! 2. staged admissions and cancellations from that pass are flushed
//! 3. the set pass: every live set element is ticked once
//! 4. remaining staged admissions and cancellations are flushed
//! 5. finished tasks are released into the pool
//! 6. trigger buffers are swapped
//!
//! Steps 4 to 6 also run when a pass fails, so a failing action never leaves
//! staged work or triggers behind.

mod diagnostics;
mod queue;
mod set;

use std::mem;

use tracing::{debug, trace, warn};

use crate::composite::{Any, Bind, Multiplex, Parallel, ParallelQueue, Repeat};
use crate::config::{ConfigError, SchedulerConfig};
use crate::decorator::{Delayed, DelayedBy, Interruptible, Unscaled};
use crate::pool::ActionPool;
use crate::{
    Action, ActionError, ActionId, Flags, Frame, FrameContext, Task, TimeStep, Triggers,
};

pub use diagnostics::{ActionInfo, FrameReport, Lane, Snapshot, Stats, VacuumReport};
pub use queue::SequentialQueue;
pub use set::ConcurrentSet;

/// Raised when tasks handed to a wrapper are not where it expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReclaimError {
    #[error("action {0} is not at the back of the queue")]
    NotAtBack(ActionId),
}

/// Owns both containers and everything reachable from a [`Frame`].
///
/// Schedulers are independent of each other: ids, triggers and the action
/// pool are all per instance.
pub struct Scheduler {
    queue: SequentialQueue,
    parallel: ConcurrentSet,
    ctx: FrameContext,
    frames: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::build(&SchedulerConfig::default())
    }

    /// Builds a scheduler, correcting invalid configuration values first.
    pub fn with_config(config: &SchedulerConfig) -> Result<Self, ConfigError> {
        Ok(Self::build(&config.sanitized()?))
    }

    fn build(config: &SchedulerConfig) -> Self {
        let ctx = FrameContext {
            pool: ActionPool::new(config.pool.capacity()),
            ..FrameContext::default()
        };
        Self {
            queue: SequentialQueue::new(config.queue.policy()),
            parallel: ConcurrentSet::new(config.parallel.policy()),
            ctx,
            frames: 0,
        }
    }

    // ===== admission =====

    /// Appends an action to the sequential queue.
    pub fn enqueue(&mut self, action: impl Action) -> ActionId {
        self.enqueue_task(Task::new(action))
    }

    pub fn enqueue_task(&mut self, mut task: Task) -> ActionId {
        let id = self.admit(&mut task);
        trace!(%id, action = %task, "enqueue");
        self.queue.push(task);
        id
    }

    /// Adds an action to the concurrent set, outside the sequential stream.
    pub fn spawn(&mut self, action: impl Action) -> ActionId {
        self.spawn_task(Task::new(action))
    }

    pub fn spawn_task(&mut self, mut task: Task) -> ActionId {
        let id = self.admit(&mut task);
        trace!(%id, action = %task, "spawn");
        self.parallel.push(task);
        id
    }

    /// Builds a task, reusing a pooled allocation of the same action type.
    pub fn acquire<A: Action>(&mut self, action: A) -> Task {
        self.ctx.pool.acquire(action)
    }

    fn admit(&mut self, task: &mut Task) -> ActionId {
        if !task.id().is_assigned() {
            task.assign_id(self.ctx.ids.next());
        }
        task.id()
    }

    // ===== reclaiming wrappers =====

    /// Takes the tasks with `ids` back out of the queue tail.
    ///
    /// `ids` are given front to back and matched from the back. An id that
    /// is not the current back is skipped with a warning; the returned tasks
    /// keep the order of `ids`.
    pub fn reclaim(&mut self, ids: &[ActionId]) -> Vec<Task> {
        let tasks = self.queue.take_back_run(ids);
        if tasks.len() != ids.len() {
            warn!(
                requested = ids.len(),
                reclaimed = tasks.len(),
                "reclaim skipped actions that were not at the back of the queue"
            );
        }
        tasks
    }

    fn reclaim_exact(&mut self, ids: &[ActionId]) -> Result<Vec<Task>, ReclaimError> {
        let tasks = self.queue.take_back_run(ids);
        if tasks.len() == ids.len() {
            return Ok(tasks);
        }

        let missing = ids
            .iter()
            .copied()
            .find(|id| !tasks.iter().any(|task| task.id() == *id))
            .unwrap_or(ActionId::UNASSIGNED);
        for task in tasks {
            self.queue.push(task);
        }
        warn!(%missing, "wrapper target is not at the back of the queue");
        Err(ReclaimError::NotAtBack(missing))
    }

    fn reclaim_one(&mut self, id: ActionId) -> Result<Task, ReclaimError> {
        self.reclaim_exact(&[id])?
            .pop()
            .ok_or(ReclaimError::NotAtBack(id))
    }

    /// Replaces the queued `ids` with a [`Multiplex`] of them.
    pub fn multiplex(&mut self, ids: &[ActionId]) -> ActionId {
        let children = self.reclaim(ids);
        self.enqueue(Multiplex::new(children))
    }

    /// Replaces the queued `ids` with a [`Parallel`] of them.
    pub fn parallel(&mut self, ids: &[ActionId]) -> ActionId {
        let children = self.reclaim(ids);
        self.enqueue(Parallel::new(children))
    }

    /// Replaces the queued `ids` with a [`ParallelQueue`] of them.
    pub fn parallel_queue(&mut self, ids: &[ActionId]) -> ActionId {
        let children = self.reclaim(ids);
        self.enqueue(ParallelQueue::new(children))
    }

    /// Replaces the queued `ids` with a nested [`SequentialQueue`] of them.
    pub fn queue(&mut self, ids: &[ActionId]) -> ActionId {
        let children = self.reclaim(ids);
        self.enqueue(SequentialQueue::from_tasks(children))
    }

    /// Replaces the queued `ids` with an [`Any`] race between them.
    pub fn any(&mut self, ids: &[ActionId]) -> ActionId {
        let children = self.reclaim(ids);
        self.enqueue(Any::new(children))
    }

    pub fn bind(&mut self, primary: ActionId, secondary: ActionId) -> Result<ActionId, ReclaimError> {
        let mut tasks = self.reclaim_exact(&[primary, secondary])?;
        let secondary = tasks.pop().ok_or(ReclaimError::NotAtBack(secondary))?;
        let primary = tasks.pop().ok_or(ReclaimError::NotAtBack(primary))?;
        Ok(self.enqueue(Bind::new(primary, secondary)))
    }

    pub fn delayed(&mut self, seconds: f32, id: ActionId) -> Result<ActionId, ReclaimError> {
        let child = self.reclaim_one(id)?;
        Ok(self.enqueue(Delayed::new(seconds, child)))
    }

    pub fn delayed_by(
        &mut self,
        trigger: impl Into<String>,
        id: ActionId,
    ) -> Result<ActionId, ReclaimError> {
        let child = self.reclaim_one(id)?;
        Ok(self.enqueue(DelayedBy::new(trigger, child)))
    }

    pub fn interruptible(
        &mut self,
        trigger: impl Into<String>,
        id: ActionId,
    ) -> Result<ActionId, ReclaimError> {
        let child = self.reclaim_one(id)?;
        Ok(self.enqueue(Interruptible::new(trigger, child)))
    }

    pub fn unscaled(&mut self, id: ActionId) -> Result<ActionId, ReclaimError> {
        let child = self.reclaim_one(id)?;
        Ok(self.enqueue(Unscaled::new(child)))
    }

    /// Enqueues a [`Repeat`] over batches built by `factory`.
    pub fn repeat(
        &mut self,
        count: u64,
        factory: impl FnMut() -> Vec<Task> + 'static,
    ) -> ActionId {
        self.enqueue(Repeat::new(count, factory))
    }

    // ===== control =====

    /// Interrupts a top-level task and evicts it.
    ///
    /// Returns `false` if no live top-level task has `id`.
    pub fn cancel(&mut self, id: ActionId) -> bool {
        let cancelled = self.cancel_now(id);
        if cancelled {
            self.flush();
            self.recycle();
        }
        cancelled
    }

    fn cancel_now(&mut self, id: ActionId) -> bool {
        let Some(mut task) = self.take_top_level(id) else {
            debug!(%id, "cancel of unknown action ignored");
            return false;
        };

        let mut frame = Frame::new(TimeStep::ZERO, &mut self.ctx);
        task.interrupt(&mut frame);
        frame.retire(task);
        debug!(%id, "cancelled");
        true
    }

    fn take_top_level(&mut self, id: ActionId) -> Option<Task> {
        if let Some(task) = self.queue.remove(id) {
            return Some(task);
        }
        if let Some(task) = self.parallel.remove(id) {
            return Some(task);
        }
        let staging = &mut self.ctx.staging;
        for staged in [&mut staging.queued, &mut staging.spawned] {
            if let Some(index) = staged.iter().position(|task| task.id() == id) {
                return Some(staged.remove(index));
            }
        }
        None
    }

    /// Raises a trigger; actions see it on the next frame.
    pub fn set_trigger(&mut self, name: impl Into<String>) {
        self.ctx.triggers.set(name);
    }

    /// Runs one frame.
    ///
    /// An action error stops the pass where it happened and is returned
    /// wrapped with the failing task's id. The failing task stays in its
    /// container.
    pub fn tick_frame(&mut self, step: TimeStep) -> Result<FrameReport, ActionError> {
        let outcome = self.pass(step);

        self.flush();
        let recycled = self.recycle();
        self.ctx.triggers.advance();
        self.frames += 1;

        outcome.map(|()| FrameReport {
            frame: self.frames,
            queued: self.queue.len(),
            parallel: self.parallel.len(),
            recycled,
        })
    }

    fn pass(&mut self, step: TimeStep) -> Result<(), ActionError> {
        let mut frame = Frame::new(step, &mut self.ctx);
        self.queue.advance(&mut frame)?;

        self.flush();

        let mut frame = Frame::new(step, &mut self.ctx);
        self.parallel.advance(&mut frame)
    }

    /// Lands staged admissions, then staged cancellations.
    ///
    /// Interrupt hooks may stage more work, so this repeats until nothing
    /// is left to cancel.
    fn flush(&mut self) {
        loop {
            for task in self.ctx.staging.queued.drain(..) {
                self.queue.push(task);
            }
            self.parallel.extend(mem::take(&mut self.ctx.staging.spawned));

            let cancelled = mem::take(&mut self.ctx.staging.cancelled);
            if cancelled.is_empty() {
                break;
            }
            for id in cancelled {
                self.cancel_now(id);
            }
        }
    }

    fn recycle(&mut self) -> usize {
        let retired = self.ctx.staging.retired.len();
        for task in self.ctx.staging.retired.drain(..) {
            trace!(id = %task.id(), "recycle");
            self.ctx.pool.release(task);
        }
        retired
    }

    /// Interrupts and drops every live and staged task, and clears triggers.
    ///
    /// Flags survive a reset.
    pub fn reset(&mut self) {
        let mut live = self.queue.drain();
        live.extend(self.parallel.drain());
        live.append(&mut self.ctx.staging.queued);
        live.append(&mut self.ctx.staging.spawned);
        let interrupted = live.len();

        let mut frame = Frame::new(TimeStep::ZERO, &mut self.ctx);
        for mut task in live {
            task.interrupt(&mut frame);
            frame.retire(task);
        }

        let staging = &mut self.ctx.staging;
        let dropped = staging.queued.len() + staging.spawned.len();
        staging.queued.clear();
        staging.spawned.clear();
        staging.cancelled.clear();

        self.recycle();
        self.ctx.triggers.clear();
        debug!(interrupted, dropped, "scheduler reset");
    }

    /// Shrinks both containers where their vacuum policy allows.
    pub fn vacuum(&mut self) -> VacuumReport {
        let report = VacuumReport {
            queue: self.queue.vacuum(),
            parallel: self.parallel.vacuum(),
        };
        debug!(
            queue = report.queue,
            parallel = report.parallel,
            queue_capacity = self.queue.capacity(),
            parallel_capacity = self.parallel.capacity(),
            "vacuum"
        );
        report
    }

    // ===== diagnostics =====

    /// Queued top-level tasks, front first.
    pub fn queued(&self) -> impl DoubleEndedIterator<Item = &Task> + '_ {
        self.queue.iter()
    }

    /// Top-level tasks in the concurrent set, in no particular order.
    pub fn running_parallel(&self) -> impl DoubleEndedIterator<Item = &Task> + '_ {
        self.parallel.iter()
    }

    /// The task the queue will tick next.
    pub fn front(&self) -> Option<&Task> {
        self.queue.front()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn parallel_len(&self) -> usize {
        self.parallel.len()
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn parallel_capacity(&self) -> usize {
        self.parallel.capacity()
    }

    /// `true` when nothing is queued, running or staged.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.parallel.is_empty() && self.ctx.staging.is_empty()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(
            self.frames,
            self.total_actions(),
            self.queue.iter(),
            self.parallel.iter(),
        )
    }

    pub fn stats(&self) -> Stats {
        Stats {
            total_created: self.total_actions(),
            pool_reused: self.ctx.pool.reused(),
            pool_released: self.ctx.pool.released(),
            pooled: self.ctx.pool.pooled(),
        }
    }

    /// Actions that ever received an id from this scheduler.
    pub fn total_actions(&self) -> u64 {
        self.ctx.ids.issued()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn triggers(&self) -> &Triggers {
        &self.ctx.triggers
    }

    pub fn flags(&self) -> &Flags {
        &self.ctx.flags
    }

    /// Flags written here are visible to actions on the next tick.
    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.ctx.flags
    }

    #[cfg(test)]
    pub(crate) fn with_frame<R>(&mut self, f: impl FnOnce(&mut Frame<'_>) -> R) -> R {
        self.with_step(TimeStep::ZERO, f)
    }

    #[cfg(test)]
    pub(crate) fn with_step<R>(&mut self, step: TimeStep, f: impl FnOnce(&mut Frame<'_>) -> R) -> R {
        f(&mut Frame::new(step, &mut self.ctx))
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::{Exec, WaitFor, WaitTicks};

    #[test]
    fn ids_are_assigned_on_admission() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.enqueue(WaitTicks::new(1));
        let b = scheduler.spawn(WaitTicks::new(1));

        assert!(a.is_assigned());
        assert!(b > a);
        assert_eq!(scheduler.total_actions(), 2);
        assert_eq!(scheduler.front().map(Task::id), Some(a));
    }

    #[test]
    fn cancel_searches_both_containers() {
        let mut scheduler = Scheduler::new();
        let queued = scheduler.enqueue(WaitFor::new("never"));
        let spawned = scheduler.spawn(WaitFor::new("never"));

        assert!(scheduler.cancel(spawned));
        assert!(scheduler.cancel(queued));
        assert!(!scheduler.cancel(queued));
        assert!(scheduler.is_idle());
        assert_eq!(scheduler.stats().pool_released, 2);
    }

    #[test]
    fn bind_restores_queue_on_miss() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.enqueue(WaitTicks::new(1));
        let b = scheduler.enqueue(WaitTicks::new(1));

        // Matching runs from the back: `a` is the id that is out of place.
        assert_eq!(scheduler.bind(b, a), Err(ReclaimError::NotAtBack(a)));
        let ids: Vec<_> = scheduler.queued().map(Task::id).collect();
        assert_eq!(ids, vec![a, b]);

        assert!(scheduler.bind(a, b).is_ok());
        assert_eq!(scheduler.queue_len(), 1);
    }

    #[test]
    fn reset_interrupts_and_clears_everything() {
        let mut scheduler = Scheduler::new();
        let fired = std::rc::Rc::new(std::cell::Cell::new(false));
        let flag = std::rc::Rc::clone(&fired);

        scheduler.enqueue(WaitFor::new("never"));
        scheduler.enqueue(Exec::new(move |_| flag.set(true)));
        scheduler.spawn(WaitFor::new("never"));
        scheduler.set_trigger("pending");

        scheduler.reset();

        assert!(scheduler.is_idle());
        assert!(fired.get());
        assert!(!scheduler.triggers().get_immediate("pending"));
    }

    #[test]
    fn reset_keeps_flags() {
        let mut scheduler = Scheduler::new();
        scheduler.flags_mut().set("chapter", 2);
        scheduler.enqueue(WaitFor::new("never"));

        scheduler.reset();
        assert_eq!(scheduler.flags().get("chapter"), 2);
    }

    #[test]
    fn staged_cancel_lands_after_queue_pass() {
        let mut scheduler = Scheduler::new();
        let target = scheduler.spawn(WaitFor::new("never"));
        scheduler.enqueue(Exec::new(move |frame| frame.cancel(target)));

        let report = scheduler.tick_frame(TimeStep::ZERO).unwrap();
        assert_eq!(report.parallel, 0);
        assert!(scheduler.is_idle());
        // Exec and the cancelled wait.
        assert_eq!(scheduler.stats().pool_released, 2);
    }

    #[test]
    fn cancel_of_nested_id_is_ignored() {
        let mut scheduler = Scheduler::new();
        let mut child = Task::new(WaitTicks::new(5));
        let child_id = scheduler.with_frame(|f| f.next_id());
        child.assign_id(child_id);
        scheduler.enqueue(Multiplex::new(vec![child]));

        assert!(!scheduler.cancel(child_id));
        assert_eq!(scheduler.queue_len(), 1);
    }

    #[test]
    fn failing_action_reports_top_level_id() {
        struct Fails;
        impl Action for Fails {
            fn run(&mut self, _frame: &mut Frame<'_>) -> crate::ActionResult {
                Err(ActionError::msg("broken prop"))
            }
        }

        let mut scheduler = Scheduler::new();
        let id = scheduler.enqueue(Multiplex::new(vec![Task::new(Fails)]));
        scheduler.set_trigger("seen");

        let err = scheduler.tick_frame(TimeStep::fixed(0.1)).unwrap_err();
        assert_eq!(err.action_id(), Some(id));
        assert_eq!(err.trail().len(), 2);
        assert_eq!(err.root_cause().to_string(), "broken prop");
        assert_eq!(scheduler.queue_len(), 1);
        // Bookkeeping still ran.
        assert_eq!(scheduler.frame_count(), 1);
        assert!(scheduler.triggers().get("seen"));
    }
}
