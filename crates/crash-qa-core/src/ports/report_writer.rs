//! Report writer port for emitting analysis results.

use crate::domain::{AnalysisResult, OrchestrationResult};

/// Port for writing analysis results.
pub trait ReportWriter: Send + Sync {
    /// Writes a single result as soon as it is available.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write(&self, result: &AnalysisResult) -> anyhow::Result<()>;

    /// Receives the complete run once the result stream has ended.
    ///
    /// Writers that stream per-result can ignore this.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn finish(&self, summary: &OrchestrationResult) -> anyhow::Result<()> {
        let _ = summary;
        Ok(())
    }

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&self) -> anyhow::Result<()>;
}
