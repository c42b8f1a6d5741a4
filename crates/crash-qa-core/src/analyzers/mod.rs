//! Analyzer implementations.
//!
//! Each analyzer implements the `Analyzer` trait for one class of crash
//! signal.

pub(crate) mod builtin;
mod pattern;

pub use builtin::{CRASH_SIGNATURES, MEMORY};
pub use pattern::{PatternAnalyzer, PatternRule};
