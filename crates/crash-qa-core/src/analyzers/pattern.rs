//! Line-oriented regex analyzer.
//!
//! Scans an input line by line and reports a finding for every line that
//! matches one of its rules.

use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;

use crate::cancel::{Cancelled, CancellationToken};
use crate::domain::{AnalysisOutcome, Analyzer, Finding, ReportFragment, ScanInput, Severity};

/// Lines scanned between two cancellation checks.
const CHECK_EVERY: usize = 256;

/// One regex and what to report when it matches.
#[derive(Debug, Clone)]
pub struct PatternRule {
    id: String,
    regex: Regex,
    message: String,
    severity: Severity,
}

impl PatternRule {
    /// Compiles a rule.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn new(
        id: impl Into<String>,
        pattern: &str,
        message: impl Into<String>,
        severity: Severity,
    ) -> anyhow::Result<Self> {
        let id = id.into();
        let regex =
            Regex::new(pattern).with_context(|| format!("invalid pattern for rule '{id}'"))?;
        Ok(Self {
            id,
            regex,
            message: message.into(),
            severity,
        })
    }

    /// Rule identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Source of the compiled pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Severity of findings from this rule.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    fn matches(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

/// Analyzer driven by a list of [`PatternRule`]s.
#[derive(Debug, Clone)]
pub struct PatternAnalyzer {
    name: String,
    description: String,
    rules: Vec<PatternRule>,
}

impl PatternAnalyzer {
    /// Creates an analyzer from compiled rules.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        rules: Vec<PatternRule>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            rules,
        }
    }

    /// Rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }
}

#[async_trait]
impl Analyzer for PatternAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn analyze(
        &self,
        input: &ScanInput,
        cancel: &CancellationToken,
    ) -> anyhow::Result<AnalysisOutcome> {
        let mut findings = Vec::new();

        for (idx, line) in input.lines().enumerate() {
            if idx > 0 && idx % CHECK_EVERY == 0 {
                if cancel.is_cancelled() {
                    return Err(Cancelled.into());
                }
                tokio::task::yield_now().await;
            }
            for rule in &self.rules {
                if rule.matches(line) {
                    findings.push(Finding::new(
                        &rule.id,
                        &rule.message,
                        rule.severity,
                        Some(idx + 1),
                    ));
                }
            }
        }

        Ok(AnalysisOutcome::from_fragment(ReportFragment::new(findings)))
    }
}
