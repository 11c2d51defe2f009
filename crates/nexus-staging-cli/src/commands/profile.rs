//! Profile command implementation.

use anyhow::{Context, Result};
use clap::Args;

use nexus_staging::StagingApi;

use super::ConnectionArgs;

/// Arguments for the profile command.
#[derive(Args)]
pub struct ProfileArgs {
    /// Package group, e.g. `org.example.lib`
    #[arg(required = true)]
    pub group: String,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Prints the id of the most specific staging profile for the group.
///
/// # Errors
///
/// Returns an error if the profiles cannot be loaded or none matches.
pub async fn execute(args: &ProfileArgs) -> Result<()> {
    let client = args.connection.client()?;

    let profile_id = client
        .find_staging_profile_id(&args.group)
        .await
        .context("Failed to load staging profiles")?
        .with_context(|| format!("No staging profile matches {}", args.group))?;

    println!("{profile_id}");
    Ok(())
}
