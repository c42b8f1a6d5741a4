//! JSON output adapter.

use std::io::{self, Write};
use std::sync::Mutex;

use anyhow::Result;
use crash_qa_core::domain::{AnalysisResult, OrchestrationResult};
use crash_qa_core::ports::ReportWriter;
use serde::Serialize;
use tracing::debug;

use crate::commands::scan::OutputFormat;

/// JSON / JSON Lines output adapter.
///
/// JSON Lines streams each result as it arrives; JSON writes one document
/// holding the summary and every result when the run finishes.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    format: OutputFormat,
    pretty: bool,
}

#[derive(Serialize)]
struct Summary {
    total: usize,
    succeeded: usize,
    failed: usize,
    with_findings: usize,
}

#[derive(Serialize)]
struct Document<'a> {
    generated_at: String,
    summary: Summary,
    results: &'a [AnalysisResult],
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout(format: OutputFormat, pretty: bool) -> Self {
        Self::new(Box::new(io::stdout()), format, pretty)
    }

    /// Creates a new JSON output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            format,
            pretty,
        }
    }

    #[allow(clippy::significant_drop_tightening)]
    fn write_line(&self, json: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }
}

impl ReportWriter for JsonOutput {
    fn write(&self, result: &AnalysisResult) -> Result<()> {
        match self.format {
            OutputFormat::Jsonl => self.write_line(&serde_json::to_string(result)?),
            OutputFormat::Json => Ok(()),
        }
    }

    fn finish(&self, summary: &OrchestrationResult) -> Result<()> {
        if self.format != OutputFormat::Json {
            return Ok(());
        }

        let document = Document {
            generated_at: iso_timestamp(),
            summary: Summary {
                total: summary.total(),
                succeeded: summary.succeeded(),
                failed: summary.failed(),
                with_findings: summary.with_findings(),
            },
            results: summary.results(),
        };
        let json = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        self.write_line(&json)
    }

    #[allow(clippy::significant_drop_tightening)]
    fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}
