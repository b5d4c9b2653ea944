use std::fmt;

use crate::collections::{RingBuffer, VacuumPolicy};
use crate::{Action, ActionError, ActionId, ActionResult, Frame, Task};

/// FIFO of tasks where only the front one is ticked.
///
/// Besides backing the scheduler's main stream, a queue is itself an
/// [`Action`] that finishes once drained. `ParallelQueue` and `Repeat` run
/// their children through one.
pub struct SequentialQueue {
    tasks: RingBuffer<Task>,
}

impl SequentialQueue {
    pub fn new(policy: VacuumPolicy) -> Self {
        Self {
            tasks: RingBuffer::with_policy(policy),
        }
    }

    /// A small fixed-size queue for nested use.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut queue = Self::new(VacuumPolicy::fixed(4));
        for task in tasks {
            queue.push(task);
        }
        queue
    }

    pub fn push(&mut self, task: Task) {
        self.tasks.push_back(task);
    }

    /// Ticks the front task once and evicts it if it finished.
    ///
    /// Returns `true` when the queue is empty afterwards.
    pub fn advance(&mut self, frame: &mut Frame<'_>) -> Result<bool, ActionError> {
        if self.tasks.is_empty() {
            return Ok(true);
        }

        if self.tasks.front_mut().execute(frame)? {
            frame.retire(self.tasks.pop_front());
        }

        Ok(self.tasks.is_empty())
    }

    /// Removes a trailing run of tasks matching `ids`, matched from the back.
    ///
    /// Ids that do not match the current back are skipped. The returned
    /// tasks keep the order of `ids`.
    pub fn take_back_run(&mut self, ids: &[ActionId]) -> Vec<Task> {
        self.tasks
            .take_back_run(ids, |task, id| task.id() == *id)
    }

    /// Removes the task with `id`, wherever it sits.
    pub fn remove(&mut self, id: ActionId) -> Option<Task> {
        self.tasks.remove_where(|task| task.id() == id)
    }

    pub fn front(&self) -> Option<&Task> {
        self.tasks.front_or_none()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.tasks.capacity()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Task> + '_ {
        self.tasks.iter()
    }

    pub fn drain(&mut self) -> Vec<Task> {
        self.tasks.drain()
    }

    pub fn vacuum(&mut self) -> bool {
        self.tasks.vacuum()
    }
}

impl Default for SequentialQueue {
    fn default() -> Self {
        Self::new(VacuumPolicy::default())
    }
}

impl Action for SequentialQueue {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        self.advance(frame)
    }

    fn visit_subactions<'a>(&'a self, visit: &mut dyn FnMut(&'a Task)) {
        self.tasks.iter().for_each(visit);
    }

    fn visit_subactions_mut(&mut self, visit: &mut dyn FnMut(&mut Task)) {
        self.tasks.iter_mut().for_each(visit);
    }

    fn recycle(&mut self) {
        self.tasks.clear();
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "Queue ({} left)", self.tasks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::WaitTicks;
    use crate::Scheduler;

    #[test]
    fn only_front_is_ticked_per_advance() {
        let mut scheduler = Scheduler::new();
        let mut queue = SequentialQueue::from_tasks([
            Task::new(WaitTicks::new(1)),
            Task::new(WaitTicks::new(1)),
        ]);

        let drained = scheduler.with_frame(|frame| queue.advance(frame)).unwrap();
        assert!(!drained);
        assert_eq!(queue.len(), 1);
        assert!(!queue.front().unwrap().is_running());

        let drained = scheduler.with_frame(|frame| queue.advance(frame)).unwrap();
        assert!(drained);
        assert!(scheduler.with_frame(|frame| queue.advance(frame)).unwrap());
    }

    #[test]
    fn describe_reports_remaining() {
        let queue = SequentialQueue::from_tasks([Task::new(WaitTicks::new(3))]);
        assert_eq!(Task::new(queue).to_string(), "Queue (1 left)");
    }
}
