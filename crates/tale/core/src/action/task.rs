use std::any::Any;
use std::fmt;

use tracing::{debug, trace};

use super::{Action, ActionError, ActionId, ActionResult, ExecutionState, Frame};

/// Owning handle around an action: what containers and composites store.
///
/// The handle drives the lifecycle so implementors of [`Action`] only write
/// `run`. Ids are assigned on admission into a container or, for children
/// that never pass through one, on their first tick.
pub struct Task {
    id: ActionId,
    state: ExecutionState,
    unscaled: bool,
    action: Box<dyn Action>,
}

impl Task {
    pub fn new(action: impl Action) -> Self {
        Self::from_boxed(Box::new(action))
    }

    pub fn from_boxed(action: Box<dyn Action>) -> Self {
        Self {
            id: ActionId::UNASSIGNED,
            state: ExecutionState::NotStarted,
            unscaled: false,
            action,
        }
    }

    /// A finished, empty task left behind where a composite drops its child.
    pub(crate) fn vacant() -> Self {
        Self {
            id: ActionId::UNASSIGNED,
            state: ExecutionState::Done,
            unscaled: false,
            action: Box::new(Vacant),
        }
    }

    #[inline]
    pub fn id(&self) -> ActionId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    /// `true` once the task runs on unscaled time.
    ///
    /// The flag sticks: it is set the first time the task is ticked or
    /// admitted from inside an unscaled subtree, and it survives hand-offs
    /// to the concurrent set.
    #[inline]
    pub fn is_unscaled(&self) -> bool {
        self.unscaled
    }

    pub(crate) fn mark_unscaled(&mut self) {
        self.unscaled = true;
    }

    /// Ticks the action once.
    ///
    /// Returns `Ok(true)` on the tick the action completes. Errors carry this
    /// task's id and description; the task stays `Running`.
    pub fn execute(&mut self, frame: &mut Frame<'_>) -> ActionResult {
        match self.state {
            ExecutionState::NotStarted => {
                if !self.id.is_assigned() {
                    self.id = frame.next_id();
                }
                self.state = ExecutionState::Running;
                trace!(id = %self.id, action = %self, "start");
            }
            ExecutionState::Running => {}
            ExecutionState::Done => {
                debug_assert!(false, "executed finished action {} ({self})", self.id);
                return Ok(true);
            }
        }

        if frame.is_unscaled() {
            self.unscaled = true;
        }
        let outcome = if self.unscaled {
            self.action.run(&mut frame.unscaled())
        } else {
            self.action.run(frame)
        };

        match outcome {
            Ok(true) => {
                self.state = ExecutionState::Done;
                trace!(id = %self.id, action = %self, "done");
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(source) => Err(ActionError::InAction {
                id: self.id,
                description: self.to_string(),
                source: Box::new(source),
            }),
        }
    }

    /// Completes the task out of band, cascading through every live child.
    pub fn interrupt(&mut self, frame: &mut Frame<'_>) {
        if self.state.is_done() {
            debug!(id = %self.id, action = %self, "interrupt on finished action ignored");
            return;
        }

        self.action.on_interrupt(frame);
        self.action.visit_subactions_mut(&mut |child| {
            if !child.is_done() {
                child.interrupt(frame);
            }
        });

        self.state = ExecutionState::Done;
        trace!(id = %self.id, "interrupted");
    }

    /// Direct children, collected for diagnostics.
    pub fn subactions(&self) -> Vec<&Task> {
        let mut children = Vec::new();
        self.action.visit_subactions(&mut |child| children.push(child));
        children
    }

    /// Borrows the concrete action if it is an `A`.
    pub fn action_ref<A: Action>(&self) -> Option<&A> {
        let action: &dyn Any = &*self.action;
        action.downcast_ref()
    }

    pub fn into_action(self) -> Box<dyn Action> {
        self.action
    }

    pub(crate) fn assign_id(&mut self, id: ActionId) {
        debug_assert!(!self.id.is_assigned(), "task {} admitted twice", self.id);
        self.id = id;
    }
}

struct Vacant;

impl Action for Vacant {
    fn run(&mut self, _frame: &mut Frame<'_>) -> ActionResult {
        Ok(true)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.action.describe(f)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("unscaled", &self.unscaled)
            .field("action", &format_args!("{self}"))
            .finish()
    }
}
