//! Versions command - list every stored version of a package.

use std::path::PathBuf;

use console::style;
use localfeed::engine::PackageService;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the versions command.
pub fn run(id: &str, root: Option<PathBuf>) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    let engine = runner.open_engine(root)?;

    let versions = engine.package_versions(id)?;
    if let Some(newest) = versions.first() {
        println!("{}", style(newest.id.as_str()).bold());
    }
    for stored in &versions {
        let marker = if stored.version.is_prerelease() {
            style("pre").yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<24} {}  {:>10} bytes  {}",
            stored.version.to_string(),
            stored.published_at.format("%Y-%m-%d %H:%M:%S UTC"),
            stored.size,
            marker
        );
    }
    Ok(())
}
