//! Resolution of logical repository names against the staging service.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use crate::client::StagingApi;
use crate::descriptor::StagingRepositoryDescriptor;
use crate::error::{Result, StagingError};
use crate::registry::DescriptorResolver;

/// How a name is turned into a remote repository.
#[derive(Debug, Clone)]
pub enum ResolutionMode {
    /// Start a new staging repository with this description.
    Create {
        /// Description of the new repository.
        description: String,
    },

    /// Reuse the single existing repository whose description matches.
    Find {
        /// Pattern matched against repository descriptions.
        description_pattern: Regex,
    },
}

/// Where the repository for a logical name lives.
#[derive(Debug, Clone)]
pub struct RepositoryTarget {
    /// Package group used to select the staging profile.
    pub package_group: String,

    /// Explicit staging profile id; skips profile discovery when set.
    pub profile_id: Option<String>,

    /// Create or find.
    pub mode: ResolutionMode,
}

impl RepositoryTarget {
    /// Target that creates a new repository.
    #[must_use]
    pub fn create(package_group: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            package_group: package_group.into(),
            profile_id: None,
            mode: ResolutionMode::Create {
                description: description.into(),
            },
        }
    }

    /// Target that finds an existing repository by description.
    #[must_use]
    pub fn find(package_group: impl Into<String>, description_pattern: Regex) -> Self {
        Self {
            package_group: package_group.into(),
            profile_id: None,
            mode: ResolutionMode::Find {
                description_pattern,
            },
        }
    }

    /// Pins the staging profile id.
    #[must_use]
    pub fn with_profile_id(mut self, profile_id: impl Into<String>) -> Self {
        self.profile_id = Some(profile_id.into());
        self
    }
}

/// Resolves configured names through a [`StagingApi`].
pub struct StagingResolver {
    api: Arc<dyn StagingApi>,
    targets: HashMap<String, RepositoryTarget>,
}

impl std::fmt::Debug for StagingResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingResolver")
            .field("targets", &self.targets)
            .finish_non_exhaustive()
    }
}

impl StagingResolver {
    /// Creates a resolver without targets.
    pub fn new(api: Arc<dyn StagingApi>) -> Self {
        Self {
            api,
            targets: HashMap::new(),
        }
    }

    /// Registers the target for a logical name.
    #[must_use]
    pub fn with_target(mut self, name: impl Into<String>, target: RepositoryTarget) -> Self {
        self.targets.insert(name.into(), target);
        self
    }

    async fn profile_id(&self, target: &RepositoryTarget) -> Result<String> {
        if let Some(ref profile_id) = target.profile_id {
            return Ok(profile_id.clone());
        }

        self.api
            .find_staging_profile_id(&target.package_group)
            .await?
            .ok_or_else(|| StagingError::NoMatchingProfile {
                package_group: target.package_group.clone(),
            })
    }
}

#[async_trait]
impl DescriptorResolver for StagingResolver {
    async fn resolve(&self, name: &str) -> Result<StagingRepositoryDescriptor> {
        let target = self
            .targets
            .get(name)
            .ok_or_else(|| StagingError::UnknownRepository {
                name: name.to_string(),
            })?;

        let profile_id = self.profile_id(target).await?;

        let descriptor = match &target.mode {
            ResolutionMode::Create { description } => {
                self.api
                    .create_staging_repository(&profile_id, description)
                    .await?
            }
            ResolutionMode::Find {
                description_pattern,
            } => {
                self.api
                    .find_staging_repository(&profile_id, description_pattern)
                    .await?
            }
        };

        tracing::info!(
            name,
            profile_id,
            repository_id = %descriptor.repository_id,
            "Resolved staging repository"
        );
        Ok(descriptor)
    }
}
