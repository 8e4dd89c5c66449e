//! CLI entry point. A thin driver over the sync pipeline (§6 "Exit and
//! error conventions"): the pipeline itself returns structured results,
//! this binary is only responsible for wiring a repository root to the
//! coordinator and mapping a fatal initialization failure to a non-zero
//! exit code.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "codegraph")]
#[command(about = "Code knowledge graph synchronization pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,

    /// Repository root path (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full sync operation over the repository and print a summary
    Index,
    /// Wipe the on-disk graph cache
    Clear,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("codegraph={log_level}")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("codegraph v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("repository root: {}", cli.root.display());

    match cli.command {
        Commands::Index => commands::index(cli.root).await,
        Commands::Clear => commands::clear(cli.root),
        Commands::Version => {
            println!("codegraph v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
