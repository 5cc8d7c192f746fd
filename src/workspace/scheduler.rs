//! Deferred visual follow-ups on a virtual clock
//!
//! Bumps and grid snaps are queued with a delay and run by
//! [`Workspace::advance_time`]. A task never holds a reference to its block;
//! it re-checks that the block still exists and is parentless when it fires.

use super::block::BlockId;
use super::connection::ConnectionRef;
use super::error::WorkspaceError;
use super::events::EventGroup;
use super::Workspace;

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Move a displaced orphan clear of the connection it was evicted from
    Bump {
        orphan: BlockId,
        away_from: ConnectionRef,
    },
    SnapToGrid {
        block: BlockId,
    },
    /// Push unrelated stacks away from a freshly dropped one
    BumpNeighbours {
        block: BlockId,
    },
}

impl Task {
    /// The block the task acts on
    pub fn block(&self) -> BlockId {
        match self {
            Task::Bump { orphan, .. } => *orphan,
            Task::SnapToGrid { block } | Task::BumpNeighbours { block } => *block,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTask {
    pub due_ms: u64,
    pub seq: u64,
    pub group: Option<EventGroup>,
    pub task: Task,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Ran,
    /// The block was gone or had been reparented
    Stale,
    /// A drag was in progress
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskReport {
    pub at_ms: u64,
    pub task: Task,
    pub outcome: TaskOutcome,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_seq: u64,
    /// Sorted by (due_ms, seq)
    queue: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn schedule(&mut self, delay_ms: u64, group: Option<EventGroup>, task: Task) {
        let due_ms = self.now_ms + delay_ms;
        let seq = self.next_seq;
        self.next_seq += 1;
        let index = self.queue.partition_point(|t| t.due_ms <= due_ms);
        self.queue.insert(
            index,
            ScheduledTask {
                due_ms,
                seq,
                group,
                task,
            },
        );
    }

    pub fn pending(&self) -> &[ScheduledTask] {
        &self.queue
    }

    /// Remove the earliest task due at or before `until_ms`, advancing the clock to it
    fn pop_due(&mut self, until_ms: u64) -> Option<ScheduledTask> {
        if self.queue.first()?.due_ms > until_ms {
            return None;
        }
        let task = self.queue.remove(0);
        self.now_ms = self.now_ms.max(task.due_ms);
        Some(task)
    }
}

impl Workspace {
    /// Advance the virtual clock, running every task that falls due
    pub fn advance_time(&mut self, ms: u64) -> Result<Vec<TaskReport>, WorkspaceError> {
        let until = self.scheduler.now_ms() + ms;
        let mut reports = Vec::new();
        while let Some(scheduled) = self.scheduler.pop_due(until) {
            let outcome = self.run_task(&scheduled)?;
            match outcome {
                TaskOutcome::Stale => tracing::warn!(task = ?scheduled.task, "stale scheduled task"),
                TaskOutcome::Skipped => tracing::debug!(task = ?scheduled.task, "skipped during drag"),
                TaskOutcome::Ran => {}
            }
            reports.push(TaskReport {
                at_ms: scheduled.due_ms,
                task: scheduled.task,
                outcome,
            });
        }
        self.scheduler.now_ms = until;
        Ok(reports)
    }

    pub(crate) fn schedule(&mut self, delay_ms: u64, task: Task) {
        let group = self.events.group();
        self.scheduler.schedule(delay_ms, group, task);
    }

    fn run_task(&mut self, scheduled: &ScheduledTask) -> Result<TaskOutcome, WorkspaceError> {
        let block = scheduled.task.block();
        let parentless = self.block(block).is_some_and(|b| b.parent.is_none());
        if !parentless {
            return Ok(TaskOutcome::Stale);
        }
        if self.is_dragging() {
            return Ok(TaskOutcome::Skipped);
        }

        let saved = self.events.group();
        self.events.set_group(scheduled.group);
        let outcome = match &scheduled.task {
            Task::Bump { orphan, away_from } => {
                let plug = self.block(*orphan).and_then(|b| b.plug_slot());
                match plug {
                    Some(slot) if self.connection(*away_from).is_some() => {
                        self.bump_away_from(ConnectionRef::new(*orphan, slot), *away_from)
                            .map(|moved| if moved { TaskOutcome::Ran } else { TaskOutcome::Skipped })
                    }
                    _ => Ok(TaskOutcome::Stale),
                }
            }
            Task::SnapToGrid { block } => self.snap_to_grid(*block).map(|_| TaskOutcome::Ran),
            Task::BumpNeighbours { block } => {
                self.bump_neighbours(*block).map(|_| TaskOutcome::Ran)
            }
        };
        self.events.set_group(saved);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::block::WorkspaceId;

    fn block(serial: u64) -> BlockId {
        BlockId {
            workspace: WorkspaceId(1),
            serial,
        }
    }

    #[test]
    fn test_tasks_ordered_by_due_then_sequence() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(250, None, Task::SnapToGrid { block: block(1) });
        scheduler.schedule(100, None, Task::SnapToGrid { block: block(2) });
        scheduler.schedule(250, None, Task::SnapToGrid { block: block(3) });
        let order: Vec<_> = scheduler.pending().iter().map(|t| t.task.block()).collect();
        assert_eq!(order, vec![block(2), block(1), block(3)]);
    }

    #[test]
    fn test_pop_due_respects_deadline() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(250, None, Task::SnapToGrid { block: block(1) });
        assert!(scheduler.pop_due(249).is_none());
        let task = scheduler.pop_due(250).unwrap();
        assert_eq!(task.task.block(), block(1));
        assert_eq!(scheduler.now_ms(), 250);
        assert!(scheduler.pending().is_empty());
    }

    #[test]
    fn test_delay_counts_from_current_time() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(10, None, Task::SnapToGrid { block: block(1) });
        scheduler.pop_due(10);
        scheduler.schedule(10, None, Task::SnapToGrid { block: block(2) });
        assert_eq!(scheduler.pending()[0].due_ms, 20);
    }
}
