//! Drop command implementation.

use anyhow::{Context, Result};
use clap::Args;

use nexus_staging::StagingApi;

use super::ConnectionArgs;

/// Arguments for the drop command.
#[derive(Args)]
pub struct DropArgs {
    /// Staging repository id
    #[arg(required = true)]
    pub repository_id: String,

    /// Description recorded with the drop
    #[arg(short, long, default_value = "Dropped by nexus-staging")]
    pub description: String,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Drops a staging repository.
///
/// # Errors
///
/// Returns an error if the drop request fails.
pub async fn execute(args: &DropArgs) -> Result<()> {
    let client = args.connection.client()?;

    client
        .drop_staging_repository(&args.repository_id, &args.description)
        .await
        .with_context(|| format!("Failed to drop {}", args.repository_id))?;

    println!("Dropped {}", args.repository_id);
    Ok(())
}
