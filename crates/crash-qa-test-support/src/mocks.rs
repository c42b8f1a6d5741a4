//! Mock implementations of core port traits.

use std::sync::{Arc, Mutex, PoisonError};

use crash_qa_core::domain::{AnalysisResult, OrchestrationResult, ScanInput};
use crash_qa_core::ports::{InputSource, ProgressEvent, ProgressSink, ReportWriter};
use crash_qa_core::progress::ProgressFrame;

/// Mock implementation of `InputSource` for testing.
///
/// Yields pre-built inputs and tracks iteration for assertions.
pub struct MockInputSource {
    inputs: Vec<ScanInput>,
    iteration_count: Arc<Mutex<usize>>,
}

impl MockInputSource {
    /// Creates a new mock source with the given inputs.
    #[must_use]
    pub fn new(inputs: Vec<ScanInput>) -> Self {
        Self {
            inputs,
            iteration_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates an empty mock source.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Returns the number of times the source has been iterated.
    #[must_use]
    pub fn iteration_count(&self) -> usize {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl InputSource for MockInputSource {
    fn inputs(&self) -> Box<dyn Iterator<Item = anyhow::Result<ScanInput>> + Send + '_> {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Box::new(self.inputs.iter().cloned().map(Ok))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.inputs.len())
    }
}

/// Mock implementation of `ReportWriter` for testing.
///
/// Captures results and the final summary for later assertions.
#[derive(Default)]
pub struct MockReportWriter {
    results: Mutex<Vec<AnalysisResult>>,
    summary: Mutex<Option<OrchestrationResult>>,
    flush_count: Mutex<usize>,
}

impl MockReportWriter {
    /// Creates a new mock writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured results in write order.
    #[must_use]
    pub fn results(&self) -> Vec<AnalysisResult> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the summary passed to `finish`, if it was called.
    #[must_use]
    pub fn summary(&self) -> Option<OrchestrationResult> {
        self.summary
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReportWriter for MockReportWriter {
    fn write(&self, result: &AnalysisResult) -> anyhow::Result<()> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result.clone());
        Ok(())
    }

    fn finish(&self, summary: &OrchestrationResult) -> anyhow::Result<()> {
        *self.summary.lock().unwrap_or_else(PoisonError::into_inner) = Some(summary.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
#[derive(Default)]
pub struct MockProgressSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns every rendered frame in order.
    #[must_use]
    pub fn frames(&self) -> Vec<ProgressFrame> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Frame(frame) => Some(frame),
                ProgressEvent::Closed => None,
            })
            .collect()
    }

    /// Returns the last rendered frame, if any.
    #[must_use]
    pub fn last_frame(&self) -> Option<ProgressFrame> {
        self.frames().pop()
    }

    /// Returns whether a `Closed` event was received.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, ProgressEvent::Closed))
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
