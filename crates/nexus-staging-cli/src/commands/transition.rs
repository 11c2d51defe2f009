//! Close and release commands.
//!
//! Both request the transition and then poll the repository state until the
//! server reports it settled, printing the final state.

use anyhow::{Context, Result};
use clap::Args;
use regex::Regex;
use tracing::info;

use nexus_staging::{RepositoryTarget, TransitionOutcome};

use super::{ConnectionArgs, PollArgs};

/// Arguments for the close and release commands.
#[derive(Args)]
pub struct TransitionArgs {
    /// Staging repository id
    #[arg(required = true)]
    pub repository_id: String,

    /// Description recorded with the transition
    #[arg(short, long, default_value = "Staged by nexus-staging")]
    pub description: String,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub poll: PollArgs,
}

/// Arguments for the close-and-release command.
#[derive(Args)]
pub struct CloseAndReleaseArgs {
    /// Package group used to select the staging profile
    #[arg(required = true)]
    pub group: String,

    /// Pattern matching the description of the repository to release
    #[arg(short, long, required = true, value_parser = super::parse_pattern)]
    pub find: Regex,

    /// Description recorded with both transitions
    #[arg(short, long, default_value = "Released by nexus-staging")]
    pub description: String,

    /// Staging profile id; skips profile discovery
    #[arg(long, env = "NEXUS_STAGING_PROFILE_ID")]
    pub profile_id: Option<String>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub poll: PollArgs,
}

/// Closes a repository and waits for validation to finish.
///
/// # Errors
///
/// Returns an error if the close fails, polling gives up or validation
/// leaves the repository open.
pub async fn close(args: &TransitionArgs) -> Result<()> {
    let service = super::service(&args.connection, args.poll.retry_config(), None)?;

    let outcome = service
        .close(&args.repository_id, &args.description)
        .await
        .with_context(|| format!("Failed to close {}", args.repository_id))?;

    print_outcome(&outcome);
    Ok(())
}

/// Releases a closed repository and waits until it is published.
///
/// # Errors
///
/// Returns an error if the release fails or polling gives up.
pub async fn release(args: &TransitionArgs) -> Result<()> {
    let service = super::service(&args.connection, args.poll.retry_config(), None)?;

    let outcome = service
        .release(&args.repository_id, &args.description)
        .await
        .with_context(|| format!("Failed to release {}", args.repository_id))?;

    print_outcome(&outcome);
    Ok(())
}

/// Finds the repository by description, then closes and releases it.
///
/// # Errors
///
/// Returns an error if the repository cannot be found uniquely or either
/// transition fails.
pub async fn close_and_release(args: &CloseAndReleaseArgs) -> Result<()> {
    let mut target = RepositoryTarget::find(&args.group, args.find.clone());
    if let Some(ref profile_id) = args.profile_id {
        target = target.with_profile_id(profile_id);
    }
    info!(group = %args.group, pattern = %args.find, "Closing and releasing");

    let service = super::service(
        &args.connection,
        args.poll.retry_config(),
        Some((args.group.clone(), target)),
    )?;

    let outcome = service
        .close_and_release(&args.group, &args.description)
        .await
        .with_context(|| format!("Failed to close and release {}", args.group))?;

    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &TransitionOutcome) {
    println!(
        "{} {}: {} after {} state read(s)",
        outcome.kind, outcome.repository.repository_id, outcome.repository.state, outcome.attempts
    );
}
