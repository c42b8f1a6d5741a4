//! Task registry owned by the bus consumer loop.

use std::collections::{BTreeMap, VecDeque};

use tracing::trace;

use super::command::{ProgressCommand, TaskId};

/// State of one tracked task.
///
/// Values handed to sinks are copies; the live registry is only ever touched
/// by the consumer loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressTask {
    /// Task id.
    pub id: TaskId,
    /// What the task is doing.
    pub description: String,
    /// Expected number of units.
    pub total: u64,
    /// Units processed so far.
    pub current: u64,
    /// Latest status line.
    pub message: String,
    /// Whether `CompleteTask` has been applied.
    pub is_completed: bool,
}

/// Running counters kept by the consumer loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// `CreateTask` commands applied.
    pub created: u64,
    /// `UpdateProgress` commands applied.
    pub updates_applied: u64,
    /// `CompleteTask` commands applied.
    pub completions_applied: u64,
    /// Commands dropped because their task was unknown or already completed.
    pub ignored: u64,
}

/// Copy of the registry state at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressFrame {
    /// Tasks not yet completed, ordered by id.
    pub active: Vec<ProgressTask>,
    /// Most recently completed tasks, oldest first.
    pub recently_completed: Vec<ProgressTask>,
    /// Counters at the time of the frame.
    pub stats: BusStats,
}

impl ProgressFrame {
    /// Looks up a task among the active ones.
    #[must_use]
    pub fn active_task(&self, id: TaskId) -> Option<&ProgressTask> {
        self.active.iter().find(|t| t.id == id)
    }

    /// Looks up a task among the recently completed ones.
    #[must_use]
    pub fn completed_task(&self, id: TaskId) -> Option<&ProgressTask> {
        self.recently_completed.iter().rev().find(|t| t.id == id)
    }
}

/// `Created -> (Updated)* -> Completed` per task; completed is terminal.
#[derive(Debug)]
pub(crate) struct TaskRegistry {
    active: BTreeMap<TaskId, ProgressTask>,
    recent: VecDeque<ProgressTask>,
    keep_completed: usize,
    stats: BusStats,
}

impl TaskRegistry {
    pub(crate) fn new(keep_completed: usize) -> Self {
        Self {
            active: BTreeMap::new(),
            recent: VecDeque::with_capacity(keep_completed),
            keep_completed,
            stats: BusStats::default(),
        }
    }

    /// Applies one command. Returns whether the visible state changed.
    pub(crate) fn apply(&mut self, command: ProgressCommand) -> bool {
        match command {
            ProgressCommand::CreateTask {
                id,
                description,
                total,
            } => {
                if self.active.contains_key(&id) {
                    return self.ignore(id, "duplicate create");
                }
                self.active.insert(
                    id,
                    ProgressTask {
                        id,
                        description,
                        total,
                        current: 0,
                        message: String::new(),
                        is_completed: false,
                    },
                );
                self.stats.created += 1;
                true
            }
            ProgressCommand::UpdateProgress {
                id,
                current,
                message,
            } => {
                let Some(task) = self.active.get_mut(&id) else {
                    return self.ignore(id, "update for inactive task");
                };
                task.current = current;
                task.message = message;
                self.stats.updates_applied += 1;
                true
            }
            ProgressCommand::CompleteTask { id } => {
                let Some(mut task) = self.active.remove(&id) else {
                    return self.ignore(id, "completion for inactive task");
                };
                task.is_completed = true;
                self.stats.completions_applied += 1;
                if self.keep_completed > 0 {
                    if self.recent.len() == self.keep_completed {
                        self.recent.pop_front();
                    }
                    self.recent.push_back(task);
                }
                true
            }
        }
    }

    fn ignore(&mut self, id: TaskId, why: &str) -> bool {
        trace!("progress bus ignoring command for {id}: {why}");
        self.stats.ignored += 1;
        false
    }

    pub(crate) fn active_len(&self) -> usize {
        self.active.len()
    }

    pub(crate) fn frame(&self) -> ProgressFrame {
        ProgressFrame {
            active: self.active.values().cloned().collect(),
            recently_completed: self.recent.iter().cloned().collect(),
            stats: self.stats,
        }
    }
}
