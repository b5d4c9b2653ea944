use crate::collections::{SwapRemoveList, VacuumPolicy};
use crate::{ActionError, ActionId, Frame, Task};

/// Unordered set of tasks, all ticked once per pass.
pub struct ConcurrentSet {
    tasks: SwapRemoveList<Task>,
}

impl ConcurrentSet {
    pub fn new(policy: VacuumPolicy) -> Self {
        Self {
            tasks: SwapRemoveList::with_policy(policy),
        }
    }

    pub fn push(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn extend(&mut self, tasks: Vec<Task>) {
        if !tasks.is_empty() {
            self.tasks.insert_many(tasks);
        }
    }

    /// Ticks every live task once, evicting those that finish.
    ///
    /// A finished task's slot is refilled by the last task, which has not
    /// run yet in this pass, so the index only moves on when the slot's
    /// occupant keeps running. Tasks spawned by a `run` are appended right
    /// after it returns.
    pub fn advance(&mut self, frame: &mut Frame<'_>) -> Result<(), ActionError> {
        let mut index = 0;
        while index < self.tasks.len() {
            let outcome = self.tasks[index].execute(frame);
            self.extend(frame.take_spawned());

            if outcome? {
                frame.retire(self.tasks.remove_at(index));
            } else {
                index += 1;
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, id: ActionId) -> Option<Task> {
        let index = self.tasks.position(|task| task.id() == id)?;
        Some(self.tasks.remove_at(index))
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

impl Default for ConcurrentSet {
    fn default() -> Self {
        Self::new(VacuumPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scheduler;
    use crate::leaf::WaitTicks;

    #[test]
    fn swapped_in_task_still_runs_this_pass() {
        let mut scheduler = Scheduler::new();
        let mut set = ConcurrentSet::default();
        set.push(Task::new(WaitTicks::new(1)));
        set.push(Task::new(WaitTicks::new(2)));
        set.push(Task::new(WaitTicks::new(3)));

        scheduler.with_frame(|frame| set.advance(frame)).unwrap();

        // The first task finished and the last one took its slot; both
        // survivors must have run exactly once.
        assert_eq!(set.len(), 2);
        let remaining: Vec<_> = set
            .iter()
            .map(|task| task.action_ref::<WaitTicks>().unwrap().remaining())
            .collect();
        assert_eq!(remaining, vec![2, 1]);
        assert!(set.iter().all(Task::is_running));
    }

    #[test]
    fn remove_by_id() {
        let mut set = ConcurrentSet::default();
        set.push(Task::new(WaitTicks::new(1)));
        assert!(set.remove(ActionId::UNASSIGNED).is_some());
        assert!(set.is_empty());
    }
}
