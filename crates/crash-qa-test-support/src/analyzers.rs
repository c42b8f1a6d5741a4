//! Scripted analyzers with predictable behaviour.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use crash_qa_core::domain::{
    AnalysisOutcome, Analyzer, Finding, ReportFragment, ScanInput, Severity,
};
use crash_qa_core::{Cancelled, CancellationToken};

/// Returns the same outcome for every input.
pub struct StaticAnalyzer {
    name: String,
    has_findings: bool,
    calls: AtomicUsize,
}

impl StaticAnalyzer {
    /// An analyzer that reports one finding per input.
    #[must_use]
    pub fn flagging(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    /// An analyzer that never reports anything.
    #[must_use]
    pub fn clean(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    fn new(name: impl Into<String>, has_findings: bool) -> Self {
        Self {
            name: name.into(),
            has_findings,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `analyze` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Analyzer for StaticAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(
        &self,
        input: &ScanInput,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<AnalysisOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.has_findings {
            return Ok(AnalysisOutcome::clean());
        }
        let finding = Finding::new(
            "static",
            format!("{} flagged {}", self.name, input.key()),
            Severity::Warning,
            None,
        );
        Ok(AnalysisOutcome::from_fragment(ReportFragment::new(vec![
            finding,
        ])))
    }
}

/// Fails for every input, or only for inputs whose key contains a marker.
pub struct FailingAnalyzer {
    name: String,
    only_key_containing: Option<String>,
}

impl FailingAnalyzer {
    /// Fails on every input.
    #[must_use]
    pub fn always(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            only_key_containing: None,
        }
    }

    /// Fails on inputs whose key contains `marker`; clean otherwise.
    #[must_use]
    pub fn on_key(name: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            only_key_containing: Some(marker.into()),
        }
    }
}

#[async_trait]
impl Analyzer for FailingAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(
        &self,
        input: &ScanInput,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<AnalysisOutcome> {
        let fails = self
            .only_key_containing
            .as_deref()
            .map_or(true, |marker| input.key().contains(marker));
        if fails {
            anyhow::bail!("{} could not analyze {}", self.name, input.key());
        }
        Ok(AnalysisOutcome::clean())
    }
}

/// Panics inside `analyze`.
pub struct PanickingAnalyzer {
    name: String,
}

impl PanickingAnalyzer {
    /// Creates the analyzer.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Analyzer for PanickingAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    #[allow(clippy::panic)]
    async fn analyze(
        &self,
        input: &ScanInput,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<AnalysisOutcome> {
        panic!("{} blew up on {}", self.name, input.key());
    }
}

/// Records how many `analyze` calls overlap.
///
/// Each call holds for `hold` before returning clean.
pub struct ConcurrencyProbe {
    name: String,
    hold: Duration,
    current: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl ConcurrencyProbe {
    /// Creates a probe holding each call for `hold`.
    #[must_use]
    pub fn new(name: impl Into<String>, hold: Duration) -> Self {
        Self {
            name: name.into(),
            hold,
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Highest number of simultaneous calls observed.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Total number of calls.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Analyzer for ConcurrencyProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(
        &self,
        _input: &ScanInput,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<AnalysisOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.hold).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(AnalysisOutcome::clean())
    }
}

/// Sleeps before returning clean, bailing out early on cancellation.
pub struct SlowAnalyzer {
    name: String,
    delay: Duration,
    started: AtomicUsize,
}

impl SlowAnalyzer {
    /// Creates an analyzer that takes `delay` per input.
    #[must_use]
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
            started: AtomicUsize::new(0),
        }
    }

    /// Number of calls that were started.
    #[must_use]
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Analyzer for SlowAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(
        &self,
        _input: &ScanInput,
        cancel: &CancellationToken,
    ) -> anyhow::Result<AnalysisOutcome> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::select! {
            () = cancel.cancelled() => Err(Cancelled.into()),
            () = tokio::time::sleep(self.delay) => Ok(AnalysisOutcome::clean()),
        }
    }
}
