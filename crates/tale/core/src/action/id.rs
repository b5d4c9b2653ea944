use std::fmt;

/// Scheduler-scoped identity of an admitted action.
///
/// Ids increase monotonically per [`Scheduler`](crate::Scheduler) and are
/// only meaningful while the action is live. A task that was never admitted
/// carries [`ActionId::UNASSIGNED`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionId(u64);

impl ActionId {
    /// Placeholder carried by tasks that have not been admitted yet. Never issued.
    pub const UNASSIGNED: Self = Self(0);

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_assigned() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#-")
        }
    }
}

/// Issues [`ActionId`]s and counts how many were handed out.
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    last: u64,
}

impl IdAllocator {
    pub(crate) fn next(&mut self) -> ActionId {
        self.last += 1;
        ActionId(self.last)
    }

    /// Total ids issued so far, i.e. total actions that entered the scheduler.
    pub(crate) fn issued(&self) -> u64 {
        self.last
    }
}
