//! Open command implementation.
//!
//! Creates a new staging repository in the profile covering the package
//! group, or finds the single existing one whose description matches.

use anyhow::{Context, Result};
use clap::Args;
use regex::Regex;
use tracing::info;

use nexus_staging::{RepositoryTarget, RetryConfig};

use super::ConnectionArgs;

/// Arguments for the open command.
#[derive(Args)]
pub struct OpenArgs {
    /// Package group used to select the staging profile
    #[arg(required = true)]
    pub group: String,

    /// Create a new repository with this description
    #[arg(short, long, conflicts_with = "find", required_unless_present = "find")]
    pub description: Option<String>,

    /// Reuse the existing repository whose description matches this pattern
    #[arg(short, long, value_parser = super::parse_pattern)]
    pub find: Option<Regex>,

    /// Staging profile id; skips profile discovery
    #[arg(long, env = "NEXUS_STAGING_PROFILE_ID")]
    pub profile_id: Option<String>,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl OpenArgs {
    /// Builds the repository target described by the arguments.
    pub fn target(&self) -> Result<RepositoryTarget> {
        let target = match (&self.description, &self.find) {
            (Some(description), None) => RepositoryTarget::create(&self.group, description),
            (None, Some(pattern)) => RepositoryTarget::find(&self.group, pattern.clone()),
            _ => anyhow::bail!("Exactly one of --description and --find is required"),
        };

        Ok(match self.profile_id {
            Some(ref profile_id) => target.with_profile_id(profile_id),
            None => target,
        })
    }
}

/// Prints the id and deploy URL of the opened repository.
///
/// # Errors
///
/// Returns an error if no profile matches, the lookup is not unique or the
/// repository cannot be created.
pub async fn execute(args: &OpenArgs) -> Result<()> {
    let target = args.target()?;
    info!(group = %args.group, "Opening staging repository");

    let service = super::service(
        &args.connection,
        RetryConfig::default(),
        Some((args.group.clone(), target)),
    )?;

    let descriptor = service
        .create_or_find(&args.group)
        .await
        .with_context(|| format!("Failed to open staging repository for {}", args.group))?;

    println!("Repository: {}", descriptor.repository_id);
    println!("Deploy URL: {}", descriptor.staging_repository_url());
    Ok(())
}
