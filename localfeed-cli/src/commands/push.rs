//! Push command - add a package archive to the feed directly.

use std::fs;
use std::path::PathBuf;

use console::style;
use localfeed::engine::PackageService;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the push command.
pub struct PushArgs {
    pub file: PathBuf,
    pub root: Option<PathBuf>,
}

/// Run the push command.
pub fn run(args: PushArgs) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    runner.log_startup("push");
    let engine = runner.open_engine(args.root)?;

    let bytes = fs::read(&args.file).map_err(|e| CliError::ReadFile {
        path: args.file.clone(),
        source: e,
    })?;
    let filename = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let stored = engine.push(&filename, &bytes)?;

    println!(
        "{} {} {}",
        style("Pushed").green().bold(),
        stored.id,
        stored.version
    );
    println!("  sha256: {}", stored.sha256);
    println!("  path:   {}", stored.archive_path().display());
    Ok(())
}
