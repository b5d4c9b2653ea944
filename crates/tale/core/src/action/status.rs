//! Lifecycle state of a scheduled action.

/// Where a [`Task`](crate::Task) is in its lifecycle.
///
/// Transitions only go forward: `NotStarted → Running → Done`. Interrupting
/// a task moves it straight to `Done` from either earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionState {
    /// Created or admitted, but never ticked.
    #[default]
    NotStarted,

    /// Ticked at least once and has not reported completion yet.
    Running,

    /// Reported completion or was interrupted. Terminal.
    Done,
}

impl ExecutionState {
    /// Returns `true` if this state is `Running`.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, ExecutionState::Running)
    }

    /// Returns `true` if this state is `Done`.
    #[inline]
    pub fn is_done(self) -> bool {
        matches!(self, ExecutionState::Done)
    }

    /// Short lowercase label used by diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            ExecutionState::NotStarted => "pending",
            ExecutionState::Running => "running",
            ExecutionState::Done => "done",
        }
    }
}
