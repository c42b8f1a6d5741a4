//! Crash QA Adapters - External adapters for crash-qa.
//!
//! This crate provides adapters for:
//! - Filesystem crash log source

pub mod fs;

pub use fs::FsInputSource;
