//! Search command - list packages matching a query.

use std::path::PathBuf;

use console::style;
use localfeed::engine::PackageService;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the search command.
pub fn run(query: Option<String>, root: Option<PathBuf>) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    let engine = runner.open_engine(root)?;

    let results = engine.search(query.as_deref())?;
    if results.is_empty() {
        println!("No packages found");
        return Ok(());
    }

    let width = results
        .iter()
        .map(|p| p.id.as_str().len())
        .max()
        .unwrap_or(0);
    for package in &results {
        println!(
            "{:<width$}  {}  {}",
            style(package.id.as_str()).bold(),
            package.version,
            package.title.as_deref().unwrap_or(""),
            width = width
        );
    }
    println!();
    println!("{} package(s)", results.len());
    Ok(())
}
