//! CLI command definitions and handlers.

pub mod analyzers;
pub mod scan;

use clap::{Parser, Subcommand};

/// Crash QA - Concurrent crash log analysis
#[derive(Parser)]
#[command(name = "crash-qa")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Shared scan arguments (paths, analyzers, flags).
    #[command(flatten)]
    pub scan: scan::ScanArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Scan crash logs for known failure signatures
    Scan(scan::ScanArgs),
    /// List available analyzers
    Analyzers,
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Scan completed, nothing found.
    Success = 0,
    /// Scan completed with findings.
    FindingsFound = 1,
    /// The scan could not run.
    Error = 2,
    /// Interrupted before all logs were analyzed.
    Cancelled = 130,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
