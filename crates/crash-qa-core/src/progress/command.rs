//! Commands carried by the progress bus.

use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use super::task::ProgressFrame;

/// Identifier of a task tracked by the bus; unique per bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// A change to the task registry.
///
/// Ordering is only guaranteed between commands carrying the same id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressCommand {
    /// Registers a new task.
    CreateTask {
        /// Fresh task id.
        id: TaskId,
        /// What the task is doing.
        description: String,
        /// Number of units the task expects to process.
        total: u64,
    },
    /// Moves a task forward.
    UpdateProgress {
        /// Task id.
        id: TaskId,
        /// Units processed so far.
        current: u64,
        /// Status line.
        message: String,
    },
    /// Finishes a task.
    CompleteTask {
        /// Task id.
        id: TaskId,
    },
}

impl ProgressCommand {
    /// Id of the task the command targets.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        match self {
            Self::CreateTask { id, .. }
            | Self::UpdateProgress { id, .. }
            | Self::CompleteTask { id } => *id,
        }
    }
}

/// Structured progress snapshot accepted by
/// [`ProgressContext::report`](super::ProgressContext::report).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressInfo {
    /// Units processed so far.
    pub current: u64,
    /// Status line.
    pub message: String,
}

impl ProgressInfo {
    /// Creates a snapshot.
    #[must_use]
    pub fn new(current: u64, message: impl Into<String>) -> Self {
        Self {
            current,
            message: message.into(),
        }
    }
}

/// What actually travels through the queue: commands, plus control requests
/// answered by the consumer loop in queue order.
#[derive(Debug)]
pub(crate) enum Envelope {
    Command(ProgressCommand),
    Drain(oneshot::Sender<()>),
    Snapshot(oneshot::Sender<ProgressFrame>),
}

/// Producer side of the bus queue. Sending never blocks and never fails
/// visibly: once the bus is gone, commands are dropped.
#[derive(Debug, Clone)]
pub(crate) struct CommandSender {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl CommandSender {
    pub(crate) const fn new(tx: mpsc::UnboundedSender<Envelope>) -> Self {
        Self { tx }
    }

    pub(crate) fn send(&self, command: ProgressCommand) {
        if let Err(e) = self.tx.send(Envelope::Command(command)) {
            trace!("progress bus closed, dropping {:?}", e.0);
        }
    }

    pub(crate) fn request(&self, envelope: Envelope) -> bool {
        self.tx.send(envelope).is_ok()
    }
}
