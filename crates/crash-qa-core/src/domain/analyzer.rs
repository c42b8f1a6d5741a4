//! Analyzer trait for pluggable checks.

use async_trait::async_trait;

use super::{ReportFragment, ScanInput};
use crate::cancel::CancellationToken;

/// What an analyzer returns for one input.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOutcome {
    /// Whether the analyzer considers the input problematic.
    pub has_findings: bool,
    /// Report contribution.
    pub fragment: ReportFragment,
}

impl AnalysisOutcome {
    /// Builds an outcome whose `has_findings` follows the fragment contents.
    #[must_use]
    pub fn from_fragment(fragment: ReportFragment) -> Self {
        Self {
            has_findings: !fragment.is_empty(),
            fragment,
        }
    }

    /// An outcome with nothing to report.
    #[must_use]
    pub fn clean() -> Self {
        Self::default()
    }
}

/// Trait for implementing analyzers.
///
/// Each analyzer examines one input for a specific class of problem.
/// Implementations must be stateless across invocations: the orchestrator
/// calls the same instance concurrently for different inputs.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Returns the registry name of this analyzer.
    fn name(&self) -> &str;

    /// One-line description for listings.
    fn description(&self) -> &str {
        ""
    }

    /// Analyzes an input.
    ///
    /// Long-running analyzers should poll `cancel` and bail out early once it
    /// is set.
    ///
    /// # Errors
    ///
    /// Returns an error if analysis fails. The orchestrator records the error
    /// as a failed result; it never aborts the run.
    async fn analyze(
        &self,
        input: &ScanInput,
        cancel: &CancellationToken,
    ) -> anyhow::Result<AnalysisOutcome>;
}
