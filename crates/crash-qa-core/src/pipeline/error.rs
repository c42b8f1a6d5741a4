//! Errors surfaced by the analysis pipeline.

use crate::domain::OrchestrationResult;

/// Errors that reach the caller of a scan.
///
/// Analyzer failures are never reported here; they become failed
/// [`AnalysisResult`](crate::domain::AnalysisResult)s.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The concurrency limit was below 1.
    #[error("concurrency limit must be at least 1, got {0}")]
    InvalidConcurrency(usize),

    /// A requested analyzer is not registered.
    #[error("unknown analyzer '{name}' (available: {available})")]
    UnknownAnalyzer {
        /// Requested name.
        name: String,
        /// Comma-separated registered names.
        available: String,
    },

    /// The run was cancelled. Yielded once, as the last stream item.
    #[error("scan cancelled")]
    Cancelled,

    /// The run was cancelled; carries what completed before it stopped.
    #[error("scan cancelled after {} result(s)", partial.total())]
    Interrupted {
        /// Results gathered before cancellation.
        partial: Box<OrchestrationResult>,
    },
}

impl ScanError {
    /// Whether this error stems from cancellation.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Interrupted { .. })
    }
}
