//! Ordered accumulation of analysis results.

use crate::domain::{AnalysisResult, OrchestrationResult};

/// Append-only collector with running tallies.
///
/// Not synchronised: the orchestrator keeps it behind a mutex because its
/// workers finish concurrently.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    inner: OrchestrationResult,
}

impl ResultAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a result and updates the counters.
    pub fn add(&mut self, result: AnalysisResult) {
        if result.success() {
            self.inner.succeeded += 1;
        } else {
            self.inner.failed += 1;
        }
        if result.has_findings() {
            self.inner.with_findings += 1;
        }
        self.inner.results.push(result);
    }

    /// Number of results appended.
    #[must_use]
    pub fn total(&self) -> usize {
        self.inner.total()
    }

    /// Number of successful results.
    #[must_use]
    pub const fn succeeded(&self) -> usize {
        self.inner.succeeded()
    }

    /// Number of failed results.
    #[must_use]
    pub const fn failed(&self) -> usize {
        self.inner.failed()
    }

    /// Number of results reporting findings.
    #[must_use]
    pub const fn with_findings(&self) -> usize {
        self.inner.with_findings()
    }

    /// Results appended so far, in order.
    #[must_use]
    pub fn results(&self) -> &[AnalysisResult] {
        self.inner.results()
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> OrchestrationResult {
        self.inner.clone()
    }

    /// Consumes the aggregator.
    #[must_use]
    pub fn into_result(self) -> OrchestrationResult {
        self.inner
    }
}
