//! CLI commands and argument parsing.

pub mod drop;
pub mod open;
pub mod profile;
pub mod state;
pub mod transition;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use nexus_staging::{
    RepositoryTarget, RetryConfig, StagingAuth, StagingClient, StagingConfig, StagingService,
};

/// nexus-staging - Open, close and release Nexus staging repositories
#[derive(Parser)]
#[command(name = "nexus-staging")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show the staging profile covering a package group
    Profile(profile::ProfileArgs),

    /// Create a staging repository or find an existing one
    Open(open::OpenArgs),

    /// Show the state of a staging repository
    State(state::StateArgs),

    /// Close a staging repository and wait for validation
    Close(transition::TransitionArgs),

    /// Release a closed staging repository and wait until it is published
    Release(transition::TransitionArgs),

    /// Find a staging repository, then close and release it
    CloseAndRelease(transition::CloseAndReleaseArgs),

    /// Drop a staging repository
    Drop(drop::DropArgs),

    /// Print version information
    Version,
}

/// Connection to the staging service, shared by every command.
#[derive(Args, Clone)]
pub struct ConnectionArgs {
    /// Staging service URL (e.g., `<https://oss.sonatype.org/service/local/>`)
    #[arg(long, env = "NEXUS_URL")]
    pub url: String,

    /// Username for basic authentication
    #[arg(short, long, env = "NEXUS_USERNAME")]
    pub username: Option<String>,

    /// Password or user token for basic authentication
    #[arg(long, env = "NEXUS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "300")]
    pub timeout: u64,

    /// Connect timeout in seconds
    #[arg(long, default_value = "300")]
    pub connect_timeout: u64,
}

impl ConnectionArgs {
    /// Builds the client configuration.
    pub fn config(&self) -> Result<StagingConfig> {
        Ok(StagingConfig::new(&self.url)
            .with_auth(self.auth()?)
            .with_timeout(Duration::from_secs(self.timeout))
            .with_connect_timeout(Duration::from_secs(self.connect_timeout)))
    }

    /// Creates the HTTP client.
    pub fn client(&self) -> Result<Arc<StagingClient>> {
        let client = StagingClient::new(self.config()?)
            .with_context(|| format!("Failed to create client for {}", self.url))?;
        Ok(Arc::new(client))
    }

    fn auth(&self) -> Result<StagingAuth> {
        if self.username.is_some() != self.password.is_some() {
            anyhow::bail!("Both --username and --password are required for basic authentication");
        }
        Ok(StagingAuth::from_credentials(
            self.username.clone(),
            self.password.clone(),
        ))
    }
}

/// Polling budget for close and release.
#[derive(Args, Debug, Clone)]
pub struct PollArgs {
    /// Maximum number of state reads while waiting for a transition
    #[arg(long, default_value = "60")]
    pub max_attempts: u32,

    /// Delay between state reads in seconds
    #[arg(long, default_value = "10")]
    pub delay: u64,
}

impl PollArgs {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::builder()
            .max_attempts(self.max_attempts)
            .delay(Duration::from_secs(self.delay))
            .build()
    }
}

/// Builds a service, registering `target` under its logical name when given.
pub fn service(
    connection: &ConnectionArgs,
    retry: RetryConfig,
    target: Option<(String, RepositoryTarget)>,
) -> Result<StagingService> {
    Ok(StagingService::with_targets(
        connection.client()?,
        target,
        retry,
    ))
}

/// Parses a description pattern.
pub fn parse_pattern(value: &str) -> Result<regex::Regex, regex::Error> {
    regex::Regex::new(value)
}
