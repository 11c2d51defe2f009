//! State command implementation.

use anyhow::{Context, Result};
use clap::Args;

use nexus_staging::StagingApi;

use super::ConnectionArgs;

/// Arguments for the state command.
#[derive(Args)]
pub struct StateArgs {
    /// Staging repository id
    #[arg(required = true)]
    pub repository_id: String,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Prints the current state of a staging repository.
///
/// # Errors
///
/// Returns an error if the state cannot be read.
pub async fn execute(args: &StateArgs) -> Result<()> {
    let client = args.connection.client()?;

    let repository = client
        .get_staging_repository_state(&args.repository_id)
        .await
        .with_context(|| format!("Failed to read state of {}", args.repository_id))?;

    println!("{repository}");
    Ok(())
}
