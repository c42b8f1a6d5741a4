//! Built-in analyzers.

use tracing::warn;

use super::{PatternAnalyzer, PatternRule};
use crate::domain::Severity;

/// Name of the crash signature analyzer.
pub const CRASH_SIGNATURES: &str = "crash-signatures";
/// Name of the memory exhaustion analyzer.
pub const MEMORY: &str = "memory";

type RuleSpec = (&'static str, &'static str, &'static str, Severity);

const CRASH_RULES: &[RuleSpec] = &[
    (
        "access-violation",
        r"(?i)(access violation|segmentation fault|SIGSEGV|EXCEPTION_ACCESS_VIOLATION)",
        "Invalid memory access",
        Severity::Critical,
    ),
    (
        "stack-overflow",
        r"(?i)(stack overflow|EXCEPTION_STACK_OVERFLOW)",
        "Stack overflow",
        Severity::Critical,
    ),
    (
        "unhandled-exception",
        r"(?i)(unhandled exception|uncaught exception|terminate called after throwing)",
        "Unhandled exception",
        Severity::Error,
    ),
    (
        "abort",
        r"(?i)(\bSIGABRT\b|abort\(\) called)",
        "Process aborted",
        Severity::Error,
    ),
];

const MEMORY_RULES: &[RuleSpec] = &[
    (
        "bad-alloc",
        r"std::bad_alloc",
        "Allocation failure",
        Severity::Critical,
    ),
    (
        "out-of-memory",
        r"(?i)(out of memory|OutOfMemoryError|cannot allocate memory)",
        "Out of memory",
        Severity::Critical,
    ),
    (
        "heap-corruption",
        r"(?i)(heap corruption|double free|free\(\): invalid pointer)",
        "Heap corruption",
        Severity::Critical,
    ),
];

fn compile(analyzer: &str, specs: &[RuleSpec]) -> Vec<PatternRule> {
    specs
        .iter()
        .filter_map(|&(id, pattern, message, severity)| {
            PatternRule::new(id, pattern, message, severity)
                .map_err(|e| warn!("Skipping built-in rule {analyzer}/{id}: {e:#}"))
                .ok()
        })
        .collect()
}

/// Every built-in analyzer.
pub(crate) fn all() -> Vec<PatternAnalyzer> {
    vec![
        PatternAnalyzer::new(
            CRASH_SIGNATURES,
            "Fatal signals, access violations and unhandled exceptions",
            compile(CRASH_SIGNATURES, CRASH_RULES),
        ),
        PatternAnalyzer::new(
            MEMORY,
            "Allocation failures and heap corruption",
            compile(MEMORY, MEMORY_RULES),
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::domain::{Analyzer, ScanInput};

    #[test]
    fn test_builtin_rules_compile() {
        let analyzers = all();
        assert_eq!(analyzers[0].rules().len(), CRASH_RULES.len());
        assert_eq!(analyzers[1].rules().len(), MEMORY_RULES.len());
    }

    #[tokio::test]
    async fn test_crash_signatures_detects_segfault() {
        let input = ScanInput::new("a.log", "Program received signal SIGSEGV, Segmentation fault.");
        let analyzers = all();
        let outcome = analyzers[0]
            .analyze(&input, &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.has_findings);
        assert_eq!(outcome.fragment.findings[0].rule, "access-violation");
    }

    #[tokio::test]
    async fn test_memory_detects_bad_alloc() {
        let input = ScanInput::new("b.log", "terminate called after throwing 'std::bad_alloc'");
        let analyzers = all();
        let outcome = analyzers[1]
            .analyze(&input, &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.has_findings);
        assert_eq!(outcome.fragment.findings[0].rule, "bad-alloc");
    }
}
