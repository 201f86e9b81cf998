//! Serve command - run the HTTP feed server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::CliError;
use crate::runner::CliRunner;
use crate::server::{self, AppState};

/// Arguments for the serve command.
pub struct ServeArgs {
    pub bind: Option<SocketAddr>,
    pub root: Option<PathBuf>,
}

/// Run the serve command.
pub fn run(args: ServeArgs) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    runner.log_startup("serve");

    let bind = args.bind.unwrap_or(runner.config().server.bind);
    let engine = runner.open_engine(args.root)?;

    println!("LocalFeed v{}", env!("CARGO_PKG_VERSION"));
    println!("==================");
    println!();
    println!("Feed root: {}", engine.store().root().display());
    println!(
        "Packages:  {} ({} versions)",
        engine.store().package_count(),
        engine.store().version_count()
    );
    println!("Listening: http://{}", bind);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Serve)?;

    let state = AppState::new(Arc::new(engine));
    runtime
        .block_on(server::serve(bind, state))
        .map_err(CliError::Serve)
}
