//! Core domain types for crash log analysis.

mod analyzer;
mod finding;
mod input;
mod result;

pub use analyzer::{AnalysisOutcome, Analyzer};
pub use finding::{Finding, ReportFragment, Severity};
pub use input::ScanInput;
pub use result::{AnalysisResult, OrchestrationResult};
