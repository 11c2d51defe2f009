//! Entry point used by build tooling.
//!
//! [`StagingService`] ties the registry and the transitioner together behind
//! the three operations a release pipeline needs: get a repository to upload
//! into, close it, release it.

use std::sync::Arc;

use crate::client::StagingApi;
use crate::config::RetryConfig;
use crate::descriptor::StagingRepositoryDescriptor;
use crate::error::Result;
use crate::registry::{DescriptorRegistry, DescriptorResolver};
use crate::resolver::{RepositoryTarget, StagingResolver};
use crate::transition::{TransitionOutcome, Transitioner};

/// Staging repository lifecycle operations.
pub struct StagingService {
    api: Arc<dyn StagingApi>,
    registry: DescriptorRegistry,
    transitioner: Transitioner,
}

impl std::fmt::Debug for StagingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingService")
            .field("registry", &self.registry)
            .field("transitioner", &self.transitioner)
            .finish_non_exhaustive()
    }
}

impl StagingService {
    /// Creates a service resolving names through `resolver`.
    pub fn new(
        api: Arc<dyn StagingApi>,
        resolver: Arc<dyn DescriptorResolver>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            registry: DescriptorRegistry::new(resolver),
            transitioner: Transitioner::new(Arc::clone(&api), retry),
            api,
        }
    }

    /// Creates a service whose names resolve to the given targets.
    pub fn with_targets(
        api: Arc<dyn StagingApi>,
        targets: impl IntoIterator<Item = (String, RepositoryTarget)>,
        retry: RetryConfig,
    ) -> Self {
        let resolver = targets
            .into_iter()
            .fold(StagingResolver::new(Arc::clone(&api)), |resolver, (name, target)| {
                resolver.with_target(name, target)
            });
        Self::new(api, Arc::new(resolver), retry)
    }

    /// Returns the descriptor registry.
    pub const fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    /// Returns the staging repository for `name`, creating or finding it once.
    ///
    /// # Errors
    ///
    /// Fails if the profile or repository cannot be resolved.
    pub async fn create_or_find(&self, name: &str) -> Result<StagingRepositoryDescriptor> {
        self.registry.get(name).await
    }

    /// Closes the repository and waits for validation to finish.
    ///
    /// # Errors
    ///
    /// See [`Transitioner::effectively_close`].
    pub async fn close(&self, repository_id: &str, description: &str) -> Result<TransitionOutcome> {
        self.transitioner
            .effectively_close(repository_id, description)
            .await
    }

    /// Releases the repository and waits until it is published.
    ///
    /// Names resolved to the repository are forgotten, since the server drops
    /// it after release.
    ///
    /// # Errors
    ///
    /// See [`Transitioner::effectively_release`].
    pub async fn release(
        &self,
        repository_id: &str,
        description: &str,
    ) -> Result<TransitionOutcome> {
        let outcome = self
            .transitioner
            .effectively_release(repository_id, description)
            .await?;
        self.registry.invalidate_repository(repository_id);
        Ok(outcome)
    }

    /// Closes and then releases the repository for `name`.
    ///
    /// # Errors
    ///
    /// Fails at the first step that fails; a failed close is not released.
    pub async fn close_and_release(
        &self,
        name: &str,
        description: &str,
    ) -> Result<TransitionOutcome> {
        let descriptor = self.create_or_find(name).await?;
        self.close(&descriptor.repository_id, description).await?;
        self.release(&descriptor.repository_id, description).await
    }

    /// Drops the repository and forgets every name resolved to it.
    ///
    /// # Errors
    ///
    /// Fails if the drop request fails.
    pub async fn drop_repository(&self, repository_id: &str, description: &str) -> Result<()> {
        self.api
            .drop_staging_repository(repository_id, description)
            .await?;
        let names = self.registry.invalidate_repository(repository_id);
        tracing::info!(repository_id, ?names, "Dropped staging repository");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StagingError;
    use crate::mock_api::{MockStagingApi, Poll};
    use crate::state::RepositoryState;
    use std::time::Duration;

    fn retry() -> RetryConfig {
        RetryConfig::builder()
            .max_attempts(5)
            .delay(Duration::from_millis(1))
            .build()
    }

    fn service(api: &Arc<MockStagingApi>) -> StagingService {
        StagingService::with_targets(
            api.clone(),
            [(
                "sonatype".to_string(),
                RepositoryTarget::create("org.example", "org.example:lib:1.0.0"),
            )],
            retry(),
        )
    }

    #[tokio::test]
    async fn test_create_or_find_is_cached() {
        let api = Arc::new(MockStagingApi::new().with_profile("P1", "org.example"));
        let service = service(&api);

        let first = service.create_or_find("sonatype").await.unwrap();
        let second = service.create_or_find("sonatype").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.count("create:"), 1);
        assert_eq!(api.count("profile:"), 1);
    }

    #[tokio::test]
    async fn test_close_and_release_invalidates_name() {
        let api = Arc::new(
            MockStagingApi::new()
                .with_profile("P1", "org.example")
                .with_script(
                    "P1-1001",
                    [
                        Poll::transitioning(RepositoryState::Open),
                        Poll::settled(RepositoryState::Closed),
                        Poll::transitioning(RepositoryState::Released),
                        Poll::NotFound,
                    ],
                ),
        );
        let service = service(&api);

        let outcome = service
            .close_and_release("sonatype", "release 1.0.0")
            .await
            .unwrap();
        assert!(outcome.repository.is_not_found());
        assert!(service.registry().peek("sonatype").is_none());

        // the next lookup starts a fresh repository
        let next = service.create_or_find("sonatype").await.unwrap();
        assert_eq!(next.repository_id, "P1-1002");
    }

    #[tokio::test]
    async fn test_failed_close_is_not_released() {
        let api = Arc::new(
            MockStagingApi::new()
                .with_profile("P1", "org.example")
                .with_script("P1-1001", [Poll::settled(RepositoryState::Open)]),
        );
        let service = service(&api);

        let err = service
            .close_and_release("sonatype", "release 1.0.0")
            .await
            .unwrap_err();
        assert!(matches!(err, StagingError::UnexpectedState { .. }));
        assert_eq!(api.count("release:"), 0);
        assert!(service.registry().peek("sonatype").is_some());
    }

    #[tokio::test]
    async fn test_drop_invalidates_name() {
        let api = Arc::new(MockStagingApi::new().with_profile("P1", "org.example"));
        let service = service(&api);

        let descriptor = service.create_or_find("sonatype").await.unwrap();
        service
            .drop_repository(&descriptor.repository_id, "abandoned")
            .await
            .unwrap();

        assert_eq!(api.count("drop:P1-1001"), 1);
        assert!(service.registry().peek("sonatype").is_none());
    }
}
