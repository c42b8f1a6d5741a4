//! Per-task progress handle.

use std::sync::atomic::{AtomicBool, Ordering};

use super::command::{CommandSender, ProgressCommand, ProgressInfo, TaskId};

/// Handle a producer uses to report progress for one task.
///
/// Every call turns into a command on the bus queue and returns immediately.
/// Completion is idempotent, reporting after completion is a no-op, and
/// dropping the handle completes the task, so a task can never be left
/// active by an early return or a panic unwinding through its owner.
#[derive(Debug)]
pub struct ProgressContext {
    id: TaskId,
    sender: CommandSender,
    completed: AtomicBool,
}

impl ProgressContext {
    pub(crate) const fn new(id: TaskId, sender: CommandSender) -> Self {
        Self {
            id,
            sender,
            completed: AtomicBool::new(false),
        }
    }

    /// Id of the task this handle reports for.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Whether [`complete`](Self::complete) has been called.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Reports `current` units done with a status message.
    pub fn update(&self, current: u64, message: impl Into<String>) {
        if self.is_completed() {
            return;
        }
        self.sender.send(ProgressCommand::UpdateProgress {
            id: self.id,
            current,
            message: message.into(),
        });
    }

    /// Same as [`update`](Self::update), from a structured snapshot.
    pub fn report(&self, info: impl Into<ProgressInfo>) {
        let info = info.into();
        self.update(info.current, info.message);
    }

    /// Marks the task completed. Only the first call has an effect.
    pub fn complete(&self) {
        if self.completed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.sender.send(ProgressCommand::CompleteTask { id: self.id });
    }

    /// Releases the handle, completing the task if needed.
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for ProgressContext {
    fn drop(&mut self) {
        self.complete();
    }
}
