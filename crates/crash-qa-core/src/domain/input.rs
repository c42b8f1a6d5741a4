//! Scan input handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One unit of work handed to the analyzers.
///
/// The key is the stable identifier used to correlate results and log lines.
/// Inputs are immutable once built and shared between work items as
/// `Arc<ScanInput>`.
#[derive(Debug, Clone)]
pub struct ScanInput {
    key: String,
    path: Option<PathBuf>,
    text: Arc<str>,
}

impl ScanInput {
    /// Creates an in-memory input with the given key and text.
    #[must_use]
    pub fn new(key: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        Self {
            key: key.into(),
            path: None,
            text: text.into(),
        }
    }

    /// Creates an input read from `path`; the key is the path as displayed.
    #[must_use]
    pub fn from_file(path: impl Into<PathBuf>, text: impl Into<Arc<str>>) -> Self {
        let path = path.into();
        Self {
            key: path.to_string_lossy().into_owned(),
            path: Some(path),
            text: text.into(),
        }
    }

    /// Stable key used for result correlation.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Origin path, if the input came from disk.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Full raw text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Iterates over lines of the raw text.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }
}
