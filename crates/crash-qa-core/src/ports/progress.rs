//! Progress rendering port for UI integration.

use crate::progress::ProgressFrame;

/// Events delivered by the progress bus to its sink.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Current state of all tracked tasks.
    Frame(ProgressFrame),
    /// The bus consumer loop has stopped; no further frames follow.
    Closed,
}

/// Port for receiving rendered progress.
///
/// The bus calls this from its single consumer loop only, so implementations
/// never see concurrent calls from the same bus. Implementations must not
/// block for long: the bus cannot apply commands while a frame is rendering.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}

/// Sink that discards everything.
impl ProgressSink for () {
    fn on_event(&self, _event: ProgressEvent) {}
}
