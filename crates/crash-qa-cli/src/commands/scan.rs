//! Scan command - analyze crash logs for failure signatures.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use crash_qa_adapters::FsInputSource;
use crash_qa_core::domain::{Analyzer, OrchestrationResult, ScanInput};
use crash_qa_core::ports::{InputSource, ProgressSink, ReportWriter};
use crash_qa_core::{
    AnalyzerRegistry, AnalyzerSelection, CancellationToken, Orchestrator, ProgressBus, ScanError,
};
use futures::StreamExt;
use tracing::{debug, info, warn};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressRenderer};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line, as results arrive)
    #[default]
    Jsonl,
    /// Single JSON document with summary, written at the end
    Json,
}

/// Parse and validate a job count (at least 1).
fn parse_jobs(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value >= 1 {
        Ok(value)
    } else {
        Err("must be at least 1".to_string())
    }
}

/// Shared arguments for crash log scanning.
#[derive(Args, Clone)]
pub struct ScanArgs {
    /// Log files or directories to analyze
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Analyzer to run (repeatable; default: all)
    #[arg(short, long = "analyzer", value_name = "NAME")]
    pub analyzers: Vec<String>,

    /// Maximum number of analyzer runs in flight
    #[arg(short, long, value_parser = parse_jobs)]
    pub jobs: Option<usize>,

    /// Show progress bars
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress and summary output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: Option<AppConfig>,
}

impl ScanArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if !args.recursive {
            args.recursive = config.general.recursive.unwrap_or(false);
        }

        if args.analyzers.is_empty() {
            args.analyzers = config.scan.analyzers.clone().unwrap_or_default();
        }

        // Jobs: CLI > config, zero from config is ignored (validate warned)
        args.jobs = args.jobs.or(config.scan.jobs.filter(|j| *j > 0));

        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }

        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        args.config = Some(config.clone());

        args
    }

    /// Get job count with fallback to the available parallelism.
    fn jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
        })
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    fn config(&self) -> AppConfig {
        self.config.clone().unwrap_or_default()
    }
}

/// Result of running the scan command.
#[allow(dead_code)] // Fields exposed for programmatic use
pub struct ScanOutcome {
    /// Number of logs loaded.
    pub inputs: usize,
    /// Number of logs that could not be read.
    pub skipped: usize,
    /// Aggregate of all analyzer results.
    pub summary: OrchestrationResult,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Builds the registry: built-ins plus `[[analyzers]]` from config.
///
/// # Errors
///
/// Returns an error if a configured analyzer does not compile.
pub fn build_registry(config: &AppConfig) -> Result<AnalyzerRegistry> {
    let mut registry = AnalyzerRegistry::with_builtin();
    for analyzer in config.custom_analyzers()? {
        debug!("Registered config analyzer {}", analyzer.name());
        registry.register(Arc::new(analyzer));
    }
    Ok(registry)
}

/// Run the scan command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &ScanArgs) -> Result<ScanOutcome> {
    info!("Running scan command on {} paths", args.paths.len());

    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }

    let config = args.config();
    let registry = build_registry(&config)?;
    let analyzers = registry.resolve(&AnalyzerSelection::from_names(args.analyzers.clone()))?;

    let mut source = FsInputSource::new(args.paths.clone(), args.recursive);
    if let Some(ref extensions) = config.general.extensions {
        source = source.with_extensions(extensions);
    }
    let (inputs, skipped) = load_inputs(&source);

    if inputs.is_empty() {
        warn!("No crash logs found, nothing to scan");
        return Ok(ScanOutcome {
            inputs: 0,
            skipped,
            summary: OrchestrationResult::default(),
            exit_code: ExitCode::Success,
        });
    }

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let output = JsonOutput::stdout(args.format(), args.pretty);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let input_count = inputs.len();
    let (summary, cancelled) = runtime.block_on(scan(
        inputs,
        analyzers,
        args.jobs(),
        &output,
        show_progress,
        &config,
    ))?;

    if !args.quiet {
        eprintln!(
            "Scanned {input_count} log(s): {} result(s), {} with findings, {} failed",
            summary.total(),
            summary.with_findings(),
            summary.failed()
        );
    }

    let exit_code = if cancelled {
        ExitCode::Cancelled
    } else if summary.with_findings() > 0 {
        ExitCode::FindingsFound
    } else {
        ExitCode::Success
    };

    Ok(ScanOutcome {
        inputs: input_count,
        skipped,
        summary,
        exit_code,
    })
}

/// Reads every input up front; unreadable logs are reported and skipped.
fn load_inputs(source: &dyn InputSource) -> (Vec<ScanInput>, usize) {
    let mut inputs = Vec::with_capacity(source.count_hint().unwrap_or_default());
    let mut skipped = 0usize;
    for loaded in source.inputs() {
        match loaded {
            Ok(input) => inputs.push(input),
            Err(e) => {
                eprintln!("WARN: Skipping: {e:#}");
                skipped += 1;
            }
        }
    }
    (inputs, skipped)
}

/// Drives one run to completion. Returns the aggregate and whether the run
/// was cancelled.
async fn scan(
    inputs: Vec<ScanInput>,
    analyzers: Vec<Arc<dyn Analyzer>>,
    jobs: usize,
    output: &JsonOutput,
    show_progress: bool,
    config: &AppConfig,
) -> Result<(OrchestrationResult, bool)> {
    let sink: Arc<dyn ProgressSink> = if show_progress {
        Arc::new(ProgressRenderer::new())
    } else {
        Arc::new(())
    };
    let bus = Arc::new(ProgressBus::new(sink, config.bus_config()));
    let cancel = CancellationToken::new();
    bus.start(&cancel)?;

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, waiting for running analyzers");
                cancel.cancel();
            }
        })
    };

    let outcome = stream_results(&bus, inputs, analyzers, jobs, output, &cancel).await;

    interrupt.abort();
    bus.shutdown().await;
    outcome
}

async fn stream_results(
    bus: &Arc<ProgressBus>,
    inputs: Vec<ScanInput>,
    analyzers: Vec<Arc<dyn Analyzer>>,
    jobs: usize,
    output: &JsonOutput,
    cancel: &CancellationToken,
) -> Result<(OrchestrationResult, bool)> {
    let mut stream = Orchestrator::new(Arc::clone(bus)).run(inputs, analyzers, jobs, cancel)?;
    let mut cancelled = false;

    while let Some(item) = stream.next().await {
        match item {
            Ok(result) => output.write(&result)?,
            Err(ScanError::Cancelled) => cancelled = true,
            Err(e) => return Err(e.into()),
        }
    }

    let summary = stream.summary();
    output.finish(&summary)?;
    output.flush()?;
    Ok((summary, cancelled))
}
