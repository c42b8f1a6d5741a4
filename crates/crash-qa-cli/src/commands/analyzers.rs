//! Analyzers command - list what a scan can run.

use anyhow::Result;

use super::scan::build_registry;
use crate::config::AppConfig;

/// Run the analyzers command.
///
/// Prints one line per registered analyzer: name, then description.
pub fn run(config: &AppConfig) -> Result<()> {
    let registry = build_registry(config)?;
    let width = registry.names().map(str::len).max().unwrap_or(0);

    for analyzer in registry.iter() {
        let description = analyzer.description();
        if description.is_empty() {
            println!("{}", analyzer.name());
        } else {
            println!("{:<width$}  {description}", analyzer.name());
        }
    }

    Ok(())
}
