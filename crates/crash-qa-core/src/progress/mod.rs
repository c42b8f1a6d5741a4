//! Progress command bus.
//!
//! Many concurrent producers report through [`ProgressContext`] handles;
//! one consumer loop owned by [`ProgressBus`] applies their commands in
//! per-task order and renders frames into a [`ProgressSink`](crate::ports::ProgressSink).

mod bus;
mod command;
mod context;
mod task;

pub use bus::{BusConfig, BusError, ProgressBus};
pub use command::{ProgressCommand, ProgressInfo, TaskId};
pub use context::ProgressContext;
pub use task::{BusStats, ProgressFrame, ProgressTask};
