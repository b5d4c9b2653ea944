//! Read-only views of scheduler state for logs and the debug overlay.

use std::fmt;

use crate::{ActionId, ExecutionState, Task};

/// Which container a top-level task lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lane {
    Queue,
    Parallel,
}

/// One row of the action tree.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionInfo {
    pub id: ActionId,
    /// Nesting level, zero for top-level tasks.
    pub depth: usize,
    pub state: ExecutionState,
    pub description: String,
    pub lane: Lane,
}

impl ActionInfo {
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }
}

/// Depth-first flattening of both containers, queue first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub frame: u64,
    pub rows: Vec<ActionInfo>,
    pub total_created: u64,
}

impl Snapshot {
    pub(crate) fn capture<'a>(
        frame: u64,
        total_created: u64,
        queue: impl Iterator<Item = &'a Task>,
        parallel: impl Iterator<Item = &'a Task>,
    ) -> Self {
        let mut rows = Vec::new();
        for task in queue {
            collect(task, 0, Lane::Queue, &mut rows);
        }
        for task in parallel {
            collect(task, 0, Lane::Parallel, &mut rows);
        }
        Self {
            frame,
            rows,
            total_created,
        }
    }

    pub fn lane(&self, lane: Lane) -> impl Iterator<Item = &ActionInfo> + '_ {
        self.rows.iter().filter(move |row| row.lane == lane)
    }

    /// Top-level rows in `lane`.
    pub fn top_level(&self, lane: Lane) -> usize {
        self.lane(lane).filter(|row| row.depth == 0).count()
    }
}

fn collect(task: &Task, depth: usize, lane: Lane, rows: &mut Vec<ActionInfo>) {
    rows.push(ActionInfo {
        id: task.id(),
        depth,
        state: task.state(),
        description: task.to_string(),
        lane,
    });
    for child in task.subactions() {
        collect(child, depth + 1, lane, rows);
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "frame {} | {} live | {} created",
            self.frame,
            self.rows.len(),
            self.total_created
        )?;
        for lane in [Lane::Queue, Lane::Parallel] {
            writeln!(f, "{lane:?}:")?;
            for row in self.lane(lane) {
                for _ in 0..row.depth {
                    f.write_str("|   ")?;
                }
                let marker = if row.is_running() { '>' } else { ' ' };
                writeln!(f, "{marker} {} {}", row.id, row.description)?;
            }
        }
        Ok(())
    }
}

/// Allocation and throughput counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_created: u64,
    pub pool_reused: u64,
    pub pool_released: u64,
    pub pooled: usize,
}

/// Summary returned by every [`Scheduler::tick_frame`](crate::Scheduler::tick_frame).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frames completed so far, this one included.
    pub frame: u64,
    pub queued: usize,
    pub parallel: usize,
    /// Finished tasks released into the pool at the end of the frame.
    pub recycled: usize,
}

impl FrameReport {
    pub fn is_idle(&self) -> bool {
        self.queued == 0 && self.parallel == 0
    }
}

/// Which containers shrank during [`Scheduler::vacuum`](crate::Scheduler::vacuum).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VacuumReport {
    pub queue: bool,
    pub parallel: bool,
}
