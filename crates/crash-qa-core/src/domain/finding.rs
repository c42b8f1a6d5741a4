//! Findings reported by analyzers.

use serde::{Deserialize, Serialize};

/// A single problem spotted by an analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Identifier of the rule that produced the finding.
    pub rule: String,
    /// Human-readable explanation.
    pub message: String,
    /// How serious the problem is.
    pub severity: Severity,
    /// 1-based line number in the input, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Finding {
    /// Creates a finding.
    #[must_use]
    pub fn new(
        rule: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        line: Option<usize>,
    ) -> Self {
        Self {
            rule: rule.into(),
            message: message.into(),
            severity,
            line,
        }
    }
}

/// Severity of a finding.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational note.
    Info,
    /// Likely problem.
    #[default]
    Warning,
    /// Definite problem.
    Error,
    /// Known crash cause.
    Critical,
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// The part of the report contributed by one analyzer for one input.
///
/// The pipeline never looks inside; it is carried through to the report
/// writer untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFragment {
    /// Findings in the order they were detected.
    pub findings: Vec<Finding>,
}

impl ReportFragment {
    /// Creates a fragment from findings.
    #[must_use]
    pub const fn new(findings: Vec<Finding>) -> Self {
        Self { findings }
    }

    /// Returns true if the fragment has no findings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse() {
        assert_eq!("critical".parse::<Severity>(), Ok(Severity::Critical));
        assert_eq!("WARN".parse::<Severity>(), Ok(Severity::Warning));
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Error);
        assert!(Severity::Info < Severity::Warning);
    }
}
