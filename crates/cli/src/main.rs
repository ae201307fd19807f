//! TrackScore CLI - Database migrations, seeding and order sync.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! ts-cli migrate
//!
//! # Insert default dashboard data and cutoff modes (safe to re-run)
//! ts-cli seed
//!
//! # Pull every order from Shopify
//! ts-cli sync
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed dashboard settings, costs, metrics and cutoff modes
//! - `sync` - Run a full order sync

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ts-cli")]
#[command(author, version, about = "TrackScore CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed default dashboard data and cutoff modes
    Seed,
    /// Sync all orders from Shopify
    Sync {
        /// Orders per page (1-250, defaults to `SYNC_PAGE_SIZE`)
        #[arg(long)]
        page_size: Option<u32>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trackscore_cli=info,trackscore_admin=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Sync { page_size } => commands::sync::run(page_size).await?,
    }
    Ok(())
}
