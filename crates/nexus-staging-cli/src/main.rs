//! nexus-staging CLI - drives staging repositories through their lifecycle.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nexus_staging=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Profile(args) => commands::profile::execute(&args).await,
        Commands::Open(args) => commands::open::execute(&args).await,
        Commands::State(args) => commands::state::execute(&args).await,
        Commands::Close(args) => commands::transition::close(&args).await,
        Commands::Release(args) => commands::transition::release(&args).await,
        Commands::CloseAndRelease(args) => commands::transition::close_and_release(&args).await,
        Commands::Drop(args) => commands::drop::execute(&args).await,
        Commands::Version => {
            println!("nexus-staging {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
