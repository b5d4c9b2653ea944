//! Composite actions.
//!
//! Composites own their children outright and decide when each of them is
//! ticked. This module provides the combinators used to author cutscenes:
//! [`Multiplex`] (run together, finish together), [`Parallel`] and
//! [`ParallelQueue`] (hand work off to the concurrent set), [`Any`] (race),
//! [`Bind`] (run alongside a primary), [`Repeat`] and [`Branch`] (pick a
//! child from a flag).

use std::fmt;
use std::mem;

use crate::scheduler::SequentialQueue;
use crate::{Action, ActionResult, Frame, Task};

fn visit_all<'a>(tasks: &'a [Task], visit: &mut dyn FnMut(&'a Task)) {
    tasks.iter().for_each(visit);
}

fn visit_all_mut(tasks: &mut [Task], visit: &mut dyn FnMut(&mut Task)) {
    tasks.iter_mut().for_each(visit);
}

/// Ticks every child each frame until all of them are done.
///
/// # Semantics
///
/// Children are ticked in the order supplied; a child that finished is
/// skipped from then on. The multiplex reports done on the frame its last
/// child reports done. With no children it is done on its first tick.
pub struct Multiplex {
    children: Vec<Task>,
}

impl Multiplex {
    pub fn new(children: Vec<Task>) -> Self {
        Self { children }
    }
}

impl Action for Multiplex {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        let mut all_done = true;
        for child in self.children.iter_mut().filter(|child| !child.is_done()) {
            if !child.execute(frame)? {
                all_done = false;
            }
        }
        Ok(all_done)
    }

    fn visit_subactions<'a>(&'a self, visit: &mut dyn FnMut(&'a Task)) {
        visit_all(&self.children, visit);
    }

    fn visit_subactions_mut(&mut self, visit: &mut dyn FnMut(&mut Task)) {
        visit_all_mut(&mut self.children, visit);
    }

    fn recycle(&mut self) {
        self.children.clear();
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let live = self.children.iter().filter(|child| !child.is_done()).count();
        write!(out, "Multiplex ({live}/{})", self.children.len())
    }
}

/// Moves its children into the concurrent set and finishes immediately.
///
/// The children become independent top-level tasks: whoever waits on the
/// `Parallel` stops waiting on the same tick, while the children keep
/// running in the set until they finish on their own.
pub struct Parallel {
    children: Vec<Task>,
}

impl Parallel {
    pub fn new(children: Vec<Task>) -> Self {
        Self { children }
    }
}

impl Action for Parallel {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        frame.spawn_all(mem::take(&mut self.children));
        Ok(true)
    }

    fn visit_subactions<'a>(&'a self, visit: &mut dyn FnMut(&'a Task)) {
        visit_all(&self.children, visit);
    }

    fn visit_subactions_mut(&mut self, visit: &mut dyn FnMut(&mut Task)) {
        visit_all_mut(&mut self.children, visit);
    }

    fn recycle(&mut self) {
        self.children.clear();
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "Parallel ({})", self.children.len())
    }
}

/// Hands a sequential run of children to the concurrent set as one task.
///
/// Like [`Parallel`] it finishes on its first tick, but the children keep
/// their relative order: they run one after another inside a nested queue
/// that lives in the set.
pub struct ParallelQueue {
    queue: Option<Task>,
}

impl ParallelQueue {
    pub fn new(children: Vec<Task>) -> Self {
        Self {
            queue: Some(Task::new(SequentialQueue::from_tasks(children))),
        }
    }
}

impl Action for ParallelQueue {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        if let Some(queue) = self.queue.take() {
            frame.spawn_task(queue);
        }
        Ok(true)
    }

    fn visit_subactions<'a>(&'a self, visit: &mut dyn FnMut(&'a Task)) {
        self.queue.iter().for_each(visit);
    }

    fn visit_subactions_mut(&mut self, visit: &mut dyn FnMut(&mut Task)) {
        self.queue.iter_mut().for_each(visit);
    }

    fn recycle(&mut self) {
        self.queue = None;
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str("ParallelQueue")
    }
}

/// Races its children: finishes as soon as one of them does.
///
/// # Semantics
///
/// Children are ticked in order each frame. When one reports done, the
/// remaining live children are interrupted and the race is over; children
/// after the winner are not ticked on that frame. With no children it is
/// done on its first tick.
pub struct Any {
    children: Vec<Task>,
}

impl Any {
    pub fn new(children: Vec<Task>) -> Self {
        Self { children }
    }
}

impl Action for Any {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        if self.children.is_empty() {
            return Ok(true);
        }

        let mut winner = None;
        for (index, child) in self.children.iter_mut().enumerate() {
            if child.execute(frame)? {
                winner = Some(index);
                break;
            }
        }

        let Some(winner) = winner else {
            return Ok(false);
        };
        for (index, child) in self.children.iter_mut().enumerate() {
            if index != winner {
                child.interrupt(frame);
            }
        }
        Ok(true)
    }

    fn visit_subactions<'a>(&'a self, visit: &mut dyn FnMut(&'a Task)) {
        visit_all(&self.children, visit);
    }

    fn visit_subactions_mut(&mut self, visit: &mut dyn FnMut(&mut Task)) {
        visit_all_mut(&mut self.children, visit);
    }

    fn recycle(&mut self) {
        self.children.clear();
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "Any ({})", self.children.len())
    }
}

/// Runs `secondary` for as long as `primary` is running.
///
/// # Semantics
///
/// `primary` is ticked first each frame. When it finishes, a still-running
/// `secondary` is interrupted and the bind completes. If `secondary`
/// finishes first, the bind keeps waiting on `primary` alone.
pub struct Bind {
    primary: Task,
    secondary: Task,
}

impl Bind {
    pub fn new(primary: Task, secondary: Task) -> Self {
        Self { primary, secondary }
    }
}

impl Action for Bind {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        if self.primary.execute(frame)? {
            if !self.secondary.is_done() {
                self.secondary.interrupt(frame);
            }
            return Ok(true);
        }
        if !self.secondary.is_done() {
            self.secondary.execute(frame)?;
        }
        Ok(false)
    }

    fn visit_subactions<'a>(&'a self, visit: &mut dyn FnMut(&'a Task)) {
        visit(&self.primary);
        visit(&self.secondary);
    }

    fn visit_subactions_mut(&mut self, visit: &mut dyn FnMut(&mut Task)) {
        visit(&mut self.primary);
        visit(&mut self.secondary);
    }

    fn recycle(&mut self) {
        self.primary = Task::vacant();
        self.secondary = Task::vacant();
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str("Bind")
    }
}

type Factory = Box<dyn FnMut() -> Vec<Task>>;

/// Runs a freshly built batch of actions, end to end, a number of times.
///
/// # Semantics
///
/// Each iteration asks the factory for a new batch and runs it as a nested
/// sequential queue, so every iteration sees brand new actions with their
/// own lifecycles. The next iteration starts on the frame after the
/// previous one finished, exactly as if the batches had been written out
/// one after another. A count of zero, or a factory returning an empty
/// batch, completes immediately.
pub struct Repeat {
    remaining: Option<u64>,
    factory: Factory,
    current: Option<Task>,
}

impl Repeat {
    pub fn new(count: u64, factory: impl FnMut() -> Vec<Task> + 'static) -> Self {
        Self {
            remaining: Some(count),
            factory: Box::new(factory),
            current: None,
        }
    }

    /// Repeats until interrupted.
    pub fn forever(factory: impl FnMut() -> Vec<Task> + 'static) -> Self {
        Self {
            remaining: None,
            factory: Box::new(factory),
            current: None,
        }
    }

    /// Iterations left, including the running one. `None` when unbounded.
    pub fn remaining(&self) -> Option<u64> {
        self.remaining
    }
}

impl Action for Repeat {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        if self.remaining == Some(0) {
            return Ok(true);
        }

        let current = match &mut self.current {
            Some(current) => current,
            empty => {
                let batch = (self.factory)();
                if batch.is_empty() {
                    return Ok(true);
                }
                empty.insert(Task::new(SequentialQueue::from_tasks(batch)))
            }
        };

        if !current.execute(frame)? {
            return Ok(false);
        }

        if let Some(finished) = self.current.take() {
            frame.retire(finished);
        }
        match &mut self.remaining {
            Some(remaining) => {
                *remaining -= 1;
                Ok(*remaining == 0)
            }
            None => Ok(false),
        }
    }

    fn visit_subactions<'a>(&'a self, visit: &mut dyn FnMut(&'a Task)) {
        self.current.iter().for_each(visit);
    }

    fn visit_subactions_mut(&mut self, visit: &mut dyn FnMut(&mut Task)) {
        self.current.iter_mut().for_each(visit);
    }

    fn recycle(&mut self) {
        self.current = None;
        self.factory = Box::new(Vec::<Task>::new);
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        match self.remaining {
            Some(remaining) => write!(out, "Repeat ({remaining} left)"),
            None => out.write_str("Repeat (forever)"),
        }
    }
}

type Selector = Box<dyn FnOnce(u64) -> Option<Task>>;

/// Chooses its child from the value of a flag.
///
/// # Semantics
///
/// On the first tick the selector is called with the flag's current value
/// (`0` if unset). `None` finishes the branch at once; otherwise the chosen
/// task is ticked on that same frame and the branch finishes with it.
/// Interrupting the branch before the first tick never calls the selector.
pub struct Branch {
    flag: String,
    selector: Option<Selector>,
    chosen: Option<Task>,
}

impl Branch {
    pub fn new(
        flag: impl Into<String>,
        selector: impl FnOnce(u64) -> Option<Task> + 'static,
    ) -> Self {
        Self {
            flag: flag.into(),
            selector: Some(Box::new(selector)),
            chosen: None,
        }
    }
}

impl Action for Branch {
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        if let Some(selector) = self.selector.take() {
            self.chosen = selector(frame.flag(&self.flag));
        }
        match &mut self.chosen {
            Some(chosen) => chosen.execute(frame),
            None => Ok(true),
        }
    }

    fn visit_subactions<'a>(&'a self, visit: &mut dyn FnMut(&'a Task)) {
        self.chosen.iter().for_each(visit);
    }

    fn visit_subactions_mut(&mut self, visit: &mut dyn FnMut(&mut Task)) {
        self.chosen.iter_mut().for_each(visit);
    }

    fn recycle(&mut self) {
        self.selector = None;
        self.chosen = None;
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let state = match (&self.selector, &self.chosen) {
            (Some(_), _) => "pending",
            (None, Some(chosen)) if !chosen.is_done() => "running",
            _ => "done",
        };
        write!(out, "Branch ({}, {state})", self.flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scheduler;
    use crate::leaf::{WaitFor, WaitTicks};

    fn ticks(n: u32) -> Task {
        Task::new(WaitTicks::new(n))
    }

    #[test]
    fn multiplex_finishes_with_slowest_child() {
        let mut scheduler = Scheduler::new();
        let mut multiplex = Task::new(Multiplex::new(vec![ticks(3), ticks(1), ticks(2)]));

        assert!(!scheduler.with_frame(|f| multiplex.execute(f)).unwrap());
        assert!(!scheduler.with_frame(|f| multiplex.execute(f)).unwrap());
        assert!(scheduler.with_frame(|f| multiplex.execute(f)).unwrap());
        assert!(multiplex.subactions().iter().all(|child| child.is_done()));
    }

    #[test]
    fn empty_combinators_finish_on_first_tick() {
        let mut scheduler = Scheduler::new();
        let mut tasks = vec![
            Task::new(Multiplex::new(Vec::new())),
            Task::new(Parallel::new(Vec::new())),
            Task::new(ParallelQueue::new(Vec::new())),
            Task::new(Any::new(Vec::new())),
            Task::new(Repeat::new(0, || vec![ticks(1)])),
            Task::new(Repeat::forever(Vec::new)),
        ];
        for task in &mut tasks {
            assert!(scheduler.with_frame(|f| task.execute(f)).unwrap(), "{task}");
        }
    }

    #[test]
    fn branch_ticks_chosen_child_on_selection_frame() {
        let mut scheduler = Scheduler::new();
        let mut branch = Task::new(Branch::new("route", |value| match value {
            1 => Some(ticks(2)),
            _ => None,
        }));

        scheduler.with_frame(|f| f.set_flag("route", 1));
        assert_eq!(branch.to_string(), "Branch (route, pending)");
        assert!(!scheduler.with_frame(|f| branch.execute(f)).unwrap());

        let chosen = branch.subactions();
        assert_eq!(chosen.len(), 1);
        assert!(chosen[0].is_running());
        assert_eq!(chosen[0].action_ref::<WaitTicks>().map(WaitTicks::remaining), Some(1));

        assert!(scheduler.with_frame(|f| branch.execute(f)).unwrap());
        assert_eq!(branch.to_string(), "Branch (route, done)");
    }

    #[test]
    fn branch_without_choice_finishes_at_once() {
        let mut scheduler = Scheduler::new();
        let seen = std::rc::Rc::new(std::cell::Cell::new(None));
        let sink = std::rc::Rc::clone(&seen);
        let mut branch = Task::new(Branch::new("unset", move |value| {
            sink.set(Some(value));
            None
        }));

        assert!(scheduler.with_frame(|f| branch.execute(f)).unwrap());
        assert_eq!(seen.get(), Some(0));
        assert!(branch.subactions().is_empty());
    }

    #[test]
    fn any_interrupts_losers() {
        let mut scheduler = Scheduler::new();
        let mut race = Task::new(Any::new(vec![ticks(5), ticks(1), ticks(5)]));

        assert!(scheduler.with_frame(|f| race.execute(f)).unwrap());
        let children = race.subactions();
        assert!(children.iter().all(|child| child.is_done()));
        // The last child never ran; it was interrupted straight from NotStarted.
        assert!(!children[2].id().is_assigned());
    }

    #[test]
    fn bind_interrupts_secondary_when_primary_finishes() {
        let mut scheduler = Scheduler::new();
        let mut bind = Task::new(Bind::new(ticks(2), Task::new(WaitFor::new("never"))));

        assert!(!scheduler.with_frame(|f| bind.execute(f)).unwrap());
        assert!(bind.subactions()[1].is_running());
        assert!(scheduler.with_frame(|f| bind.execute(f)).unwrap());
        assert!(bind.subactions()[1].is_done());
    }

    #[test]
    fn bind_keeps_waiting_after_secondary_finishes() {
        let mut scheduler = Scheduler::new();
        let mut bind = Task::new(Bind::new(ticks(3), ticks(1)));

        assert!(!scheduler.with_frame(|f| bind.execute(f)).unwrap());
        assert!(bind.subactions()[1].is_done());
        assert!(!scheduler.with_frame(|f| bind.execute(f)).unwrap());
        assert!(scheduler.with_frame(|f| bind.execute(f)).unwrap());
    }

    #[test]
    fn repeat_counts_down_per_iteration() {
        let mut scheduler = Scheduler::new();
        let mut repeat = Task::new(Repeat::new(2, || vec![ticks(1), ticks(1)]));

        let mut frames = 0;
        while !scheduler.with_frame(|f| repeat.execute(f)).unwrap() {
            frames += 1;
            assert!(frames < 10, "repeat never finished");
        }
        // Two batches of two single-tick actions.
        assert_eq!(frames + 1, 4);
    }

    #[test]
    fn forever_repeat_stops_only_on_interrupt() {
        let mut scheduler = Scheduler::new();
        let mut repeat = Task::new(Repeat::forever(|| vec![ticks(1)]));

        for _ in 0..5 {
            assert!(!scheduler.with_frame(|f| repeat.execute(f)).unwrap());
        }
        scheduler.with_frame(|f| repeat.interrupt(f));
        assert!(repeat.is_done());
        assert_eq!(repeat.to_string(), "Repeat (forever)");
    }
}
