//! Analysis result types.

use std::time::Duration;

use serde::{Serialize, Serializer};

use super::ReportFragment;

/// Result of running one analyzer against one input.
///
/// Only the [`succeeded`](Self::succeeded) and [`failed`](Self::failed)
/// constructors exist, so a failed result never carries a fragment and a
/// successful one never carries an error.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    input: String,
    analyzer: String,
    success: bool,
    has_findings: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    fragment: Option<ReportFragment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    duration: Duration,
}

impl AnalysisResult {
    /// A successful analyzer invocation.
    #[must_use]
    pub fn succeeded(
        input: impl Into<String>,
        analyzer: impl Into<String>,
        has_findings: bool,
        fragment: ReportFragment,
        duration: Duration,
    ) -> Self {
        Self {
            input: input.into(),
            analyzer: analyzer.into(),
            success: true,
            has_findings,
            fragment: Some(fragment),
            error: None,
            duration,
        }
    }

    /// A failed analyzer invocation.
    #[must_use]
    pub fn failed(
        input: impl Into<String>,
        analyzer: impl Into<String>,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            input: input.into(),
            analyzer: analyzer.into(),
            success: false,
            has_findings: false,
            fragment: None,
            error: Some(error.into()),
            duration,
        }
    }

    /// Key of the input this result belongs to.
    #[must_use]
    pub fn input_key(&self) -> &str {
        &self.input
    }

    /// Name of the analyzer that produced this result.
    #[must_use]
    pub fn analyzer(&self) -> &str {
        &self.analyzer
    }

    /// Whether the analyzer ran to completion.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    /// Whether the analyzer reported findings.
    #[must_use]
    pub const fn has_findings(&self) -> bool {
        self.has_findings
    }

    /// Report fragment, present only on success.
    #[must_use]
    pub const fn fragment(&self) -> Option<&ReportFragment> {
        self.fragment.as_ref()
    }

    /// Error message, present only on failure.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Wall-clock time spent in the analyzer.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(duration.as_millis())
}

/// Everything one orchestration run produced, in completion order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrchestrationResult {
    pub(crate) results: Vec<AnalysisResult>,
    pub(crate) succeeded: usize,
    pub(crate) failed: usize,
    pub(crate) with_findings: usize,
}

impl OrchestrationResult {
    /// All results, in the order they were appended.
    #[must_use]
    pub fn results(&self) -> &[AnalysisResult] {
        &self.results
    }

    /// Total number of results.
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Number of successful results.
    #[must_use]
    pub const fn succeeded(&self) -> usize {
        self.succeeded
    }

    /// Number of failed results.
    #[must_use]
    pub const fn failed(&self) -> usize {
        self.failed
    }

    /// Number of results with findings.
    #[must_use]
    pub const fn with_findings(&self) -> usize {
        self.with_findings
    }

    /// Consumes the collection, returning the results.
    #[must_use]
    pub fn into_results(self) -> Vec<AnalysisResult> {
        self.results
    }
}
