//! # Nexus Staging
//!
//! Staging repository lifecycle client for Nexus-style repository managers.
//!
//! Artifacts are published by uploading them into a *staging repository*,
//! closing it (which triggers server-side validation) and releasing it
//! (which publishes the content and drops the staging repository). Closing
//! and releasing are asynchronous on the server; this crate waits for each
//! transition to settle before reporting success.
//!
//! ## Features
//!
//! - **Profile discovery**: Longest dot-boundary match of a package group
//!   against the configured staging profiles
//! - **Create or find**: Start a new staging repository, or reuse the single
//!   existing one whose description matches a pattern
//! - **Effective transitions**: Close and release with bounded polling of the
//!   repository state
//! - **Registry**: At-most-once resolution of logical names under concurrency
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use nexus_staging::{
//!     RepositoryTarget, RetryConfig, StagingAuth, StagingClient, StagingConfig, StagingService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StagingConfig::new("https://oss.sonatype.org/service/local/")
//!         .with_auth(StagingAuth::basic("deployer", "secret"));
//!     let client = Arc::new(StagingClient::new(config)?);
//!
//!     let service = StagingService::with_targets(
//!         client,
//!         [(
//!             "sonatype".to_string(),
//!             RepositoryTarget::create("org.example", "org.example:lib:1.0.0"),
//!         )],
//!         RetryConfig::default(),
//!     );
//!
//!     let descriptor = service.create_or_find("sonatype").await?;
//!     println!("upload to {}", descriptor.staging_repository_url());
//!
//!     service.close_and_release("sonatype", "org.example:lib:1.0.0").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    StagingService                           │
//! │  ┌─────────────────────┐       ┌─────────────────────────┐  │
//! │  │ DescriptorRegistry  │       │      Transitioner       │  │
//! │  │  (name → repo id)   │       │  (request + poll state) │  │
//! │  └──────────┬──────────┘       └────────────┬────────────┘  │
//! │             │ StagingResolver               │ ActionRetrier │
//! └─────────────┼───────────────────────────────┼───────────────┘
//!               ▼                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              StagingApi (StagingClient, HTTP)               │
//! └─────────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │               Nexus staging REST endpoints                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod client;
mod config;
mod descriptor;
mod error;
mod profile;
mod registry;
mod resolver;
mod retrier;
mod service;
mod state;
mod transition;
mod wire;

#[cfg(test)]
mod mock_api;

pub use client::{StagingApi, StagingClient};
pub use config::{RetryConfig, RetryConfigBuilder, StagingAuth, StagingConfig};
pub use descriptor::StagingRepositoryDescriptor;
pub use error::{Result, StagingError};
pub use profile::{profile_matches, select_profile};
pub use registry::{DescriptorRegistry, DescriptorResolver};
pub use resolver::{RepositoryTarget, ResolutionMode, StagingResolver};
pub use retrier::{ActionRetrier, RetryError, RetryOutcome};
pub use service::StagingService;
pub use state::{RepositoryState, StagingRepository};
pub use transition::{TransitionKind, TransitionOutcome, Transitioner};
pub use wire::StagingProfile;
