//! Crash-QA core library.
//!
//! Domain types, port traits and the concurrent scan pipeline for crash log
//! analysis. Adapters for the filesystem and the terminal live in sibling
//! crates.

pub mod analyzers;
pub mod cancel;
pub mod domain;
pub mod pipeline;
pub mod ports;
pub mod progress;

pub use cancel::{Cancelled, CancellationToken};
pub use pipeline::{
    AnalyzerRegistry, AnalyzerSelection, Orchestrator, ScanError, ScanStream,
};
pub use progress::{BusConfig, ProgressBus, ProgressContext};
