//! Configuration file support for crash-qa.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/crash-qa/config.toml` (lowest priority)
//! - Project-local: `.crash-qa.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use crash_qa_core::analyzers::{PatternAnalyzer, PatternRule};
use crash_qa_core::domain::Severity;
use crash_qa_core::BusConfig;
use serde::Deserialize;
use tracing::{debug, info};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Scheduling settings.
    pub scan: ScanConfig,
    /// Progress rendering settings.
    pub progress: ProgressConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
    /// User-defined pattern analyzers.
    pub analyzers: Vec<AnalyzerDef>,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Recurse into subdirectories by default.
    pub recursive: Option<bool>,
    /// File extensions picked up from directories.
    pub extensions: Option<Vec<String>>,
}

/// Scan scheduling configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Maximum number of analyzer invocations in flight.
    pub jobs: Option<usize>,
    /// Analyzers to run when none are given on the command line.
    pub analyzers: Option<Vec<String>>,
}

/// Progress rendering configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Minimum milliseconds between two redraws.
    pub render_interval_ms: Option<u64>,
    /// Completed tasks kept in the display.
    pub keep_completed: Option<usize>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bars.
    pub progress: Option<bool>,
}

/// A pattern analyzer declared in `[[analyzers]]`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerDef {
    /// Registry name.
    pub name: String,
    /// One-line description.
    #[serde(default)]
    pub description: Option<String>,
    /// Rules evaluated on every line.
    #[serde(default)]
    pub rules: Vec<RuleDef>,
}

/// One rule of a user-defined analyzer.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDef {
    /// Rule identifier reported with findings.
    pub id: String,
    /// Regular expression matched against each line.
    pub pattern: String,
    /// Finding message; defaults to the rule id.
    #[serde(default)]
    pub message: Option<String>,
    /// Finding severity; defaults to `warning`.
    #[serde(default)]
    pub severity: Option<String>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/crash-qa/config.toml`
    /// 2. Project-local: `.crash-qa.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        // Load XDG config (lowest priority)
        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        // Load project-local config (higher priority, merged)
        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    fn validate(&self) -> Result<(), String> {
        if self.scan.jobs == Some(0) {
            return Err("scan.jobs must be at least 1, got 0".to_string());
        }

        if self.progress.render_interval_ms == Some(0) {
            return Err("progress.render_interval_ms must be at least 1, got 0".to_string());
        }

        if let Some(ref f) = self.output.format {
            if f != "json" && f != "jsonl" {
                return Err(format!(
                    "output.format must be 'json' or 'jsonl', got '{f}'"
                ));
            }
        }

        for def in &self.analyzers {
            if def.name.trim().is_empty() {
                return Err("analyzers.name must not be empty".to_string());
            }
            if def.rules.is_empty() {
                return Err(format!("analyzer '{}' has no rules", def.name));
            }
            for rule in &def.rules {
                if let Some(ref s) = rule.severity {
                    s.parse::<Severity>()
                        .map_err(|e| format!("analyzer '{}' rule '{}': {e}", def.name, rule.id))?;
                }
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // General
        self.general.recursive = other.general.recursive.or(self.general.recursive);
        self.general.extensions = other
            .general
            .extensions
            .or_else(|| self.general.extensions.take());

        // Scan
        self.scan.jobs = other.scan.jobs.or(self.scan.jobs);
        self.scan.analyzers = other.scan.analyzers.or_else(|| self.scan.analyzers.take());

        // Progress
        self.progress.render_interval_ms = other
            .progress
            .render_interval_ms
            .or(self.progress.render_interval_ms);
        self.progress.keep_completed = other
            .progress
            .keep_completed
            .or(self.progress.keep_completed);

        // Output
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);

        // Analyzers: a later definition replaces an earlier one of the same name
        for def in other.analyzers {
            self.analyzers.retain(|existing| existing.name != def.name);
            self.analyzers.push(def);
        }
    }

    /// Progress bus settings, falling back to the bus defaults.
    pub fn bus_config(&self) -> BusConfig {
        let defaults = BusConfig::default();
        BusConfig {
            render_interval: self
                .progress
                .render_interval_ms
                .filter(|ms| *ms > 0)
                .map_or(defaults.render_interval, Duration::from_millis),
            keep_completed: self
                .progress
                .keep_completed
                .unwrap_or(defaults.keep_completed),
        }
    }

    /// Compiles the `[[analyzers]]` definitions.
    ///
    /// # Errors
    ///
    /// Returns an error naming the analyzer and rule for an invalid pattern
    /// or severity.
    pub fn custom_analyzers(&self) -> anyhow::Result<Vec<PatternAnalyzer>> {
        self.analyzers.iter().map(AnalyzerDef::build).collect()
    }
}

impl AnalyzerDef {
    fn build(&self) -> anyhow::Result<PatternAnalyzer> {
        let rules = self
            .rules
            .iter()
            .map(|rule| {
                let severity = rule
                    .severity
                    .as_deref()
                    .map(str::parse::<Severity>)
                    .transpose()
                    .map_err(anyhow::Error::msg)?
                    .unwrap_or_default();
                PatternRule::new(
                    &rule.id,
                    &rule.pattern,
                    rule.message.clone().unwrap_or_else(|| rule.id.clone()),
                    severity,
                )
            })
            .collect::<anyhow::Result<Vec<_>>>()
            .with_context(|| format!("Invalid analyzer '{}' in config", self.name))?;

        Ok(PatternAnalyzer::new(
            &self.name,
            self.description.clone().unwrap_or_default(),
            rules,
        ))
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("crash-qa").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.crash-qa.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".crash-qa.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
