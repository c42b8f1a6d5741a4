//! Filesystem adapter for loading crash logs.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use crash_qa_core::domain::ScanInput;
use crash_qa_core::ports::InputSource;
use tracing::{debug, warn};

/// Extensions picked up when scanning directories.
pub const DEFAULT_EXTENSIONS: &[&str] = &["log", "txt"];

/// Filesystem crash log source adapter.
///
/// The directory walk runs once, on the first call to `inputs` or
/// `count_hint`; later calls reuse the file list.
pub struct FsInputSource {
    paths: Vec<PathBuf>,
    recursive: bool,
    extensions: Vec<String>,
    files: OnceLock<Vec<PathBuf>>,
}

impl FsInputSource {
    /// Creates a new filesystem source.
    ///
    /// # Arguments
    ///
    /// * `paths` - Files or directories to scan
    /// * `recursive` - Whether to recurse into subdirectories
    #[must_use]
    pub fn new(paths: Vec<PathBuf>, recursive: bool) -> Self {
        Self {
            paths,
            recursive,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            files: OnceLock::new(),
        }
    }

    /// Replaces the accepted extensions (case-insensitive, without dot).
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self.files = OnceLock::new();
        self
    }

    fn files(&self) -> &[PathBuf] {
        self.files.get_or_init(|| {
            let files = self.collect_files();
            debug!("Found {} log files", files.len());
            files
        })
    }

    /// Collects all matching files from the configured paths, sorted within
    /// each directory.
    fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in &self.paths {
            if path.is_file() {
                if self.is_supported(path) {
                    files.push(path.clone());
                } else {
                    warn!("Unsupported file type: {}", path.display());
                }
            } else if path.is_dir() {
                self.collect_from_dir(path, &mut files);
            } else {
                warn!("Path does not exist: {}", path.display());
            }
        }

        files
    }

    fn collect_from_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!("Failed to read directory {}: {e}", dir.display());
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();

        for path in paths {
            if path.is_file() && self.is_supported(&path) {
                files.push(path);
            } else if path.is_dir() && self.recursive {
                self.collect_from_dir(&path, files);
            }
        }
    }

    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .is_some_and(|e| self.extensions.iter().any(|x| *x == e))
    }
}

impl InputSource for FsInputSource {
    fn inputs(&self) -> Box<dyn Iterator<Item = Result<ScanInput>> + Send + '_> {
        Box::new(self.files().iter().map(|path| load_log(path)))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.files().len())
    }
}

/// Reads a log file, replacing invalid UTF-8 sequences.
fn load_log(path: &Path) -> Result<ScanInput> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read log: {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Ok(ScanInput::from_file(path, text))
}
