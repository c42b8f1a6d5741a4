//! Scan pipeline: analyzer lookup, scheduling and result aggregation.

mod aggregator;
mod error;
mod orchestrator;
mod registry;

pub use aggregator::ResultAggregator;
pub use error::ScanError;
pub use orchestrator::{BatchProgress, Orchestrator, ScanStream};
pub use registry::{AnalyzerRegistry, AnalyzerSelection};
