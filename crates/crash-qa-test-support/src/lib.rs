//! Test support utilities for crash-qa.
//!
//! Provides mocks, scripted analyzers and crash log builders for testing
//! the crash-qa scan pipeline.
//!
//! # Example
//!
//! ```
//! use crash_qa_test_support::{CrashLogBuilder, MockInputSource};
//!
//! let crashed = CrashLogBuilder::new("app.log").segfault().build();
//! let clean = CrashLogBuilder::new("ok.log").info("started").build();
//!
//! let source = MockInputSource::new(vec![crashed, clean]);
//! ```

mod analyzers;
mod builders;
mod mocks;

pub use analyzers::{
    ConcurrencyProbe, FailingAnalyzer, PanickingAnalyzer, SlowAnalyzer, StaticAnalyzer,
};
pub use builders::CrashLogBuilder;
pub use mocks::{MockInputSource, MockProgressSink, MockReportWriter};
