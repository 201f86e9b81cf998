//! LocalFeed CLI - local package feed server and client
//!
//! ```text
//! localfeed serve [--bind ADDR] [--root DIR]
//! localfeed push <FILE> [--root DIR]
//! localfeed search [QUERY] [--root DIR]
//! localfeed versions <ID> [--root DIR]
//! localfeed config get|set|list|path
//! ```

mod commands;
mod error;
mod runner;
mod server;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use console::style;

use commands::config::ConfigCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "localfeed", version, about = "Local package feed")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP feed server
    Serve {
        /// Address to listen on (default from config, 127.0.0.1:5000)
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Feed root directory (default from config)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Add a package archive to the feed
    Push {
        /// Package archive (.nupkg)
        file: PathBuf,

        /// Feed root directory (default from config)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Search packages by id substring
    Search {
        /// Case-insensitive id substring; omit to list everything
        query: Option<String>,

        /// Feed root directory (default from config)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// List every stored version of a package, newest first
    Versions {
        /// Package id (any casing)
        id: String,

        /// Feed root directory (default from config)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// View or edit configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Serve { bind, root } => {
            commands::serve::run(commands::serve::ServeArgs { bind, root })
        }
        Commands::Push { file, root } => {
            commands::push::run(commands::push::PushArgs { file, root })
        }
        Commands::Search { query, root } => commands::search::run(query, root),
        Commands::Versions { id, root } => commands::versions::run(&id, root),
        Commands::Config { command } => commands::config::run(command),
    }
}
