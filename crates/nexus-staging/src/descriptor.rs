//! Resolved location of a staging repository.

use url::Url;

/// Where a staging repository lives: the service it belongs to and its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingRepositoryDescriptor {
    /// Base URL of the staging service (always ends with `/`).
    pub base_url: Url,

    /// Repository id assigned by the server.
    pub repository_id: String,
}

impl StagingRepositoryDescriptor {
    /// Creates a new descriptor.
    #[must_use]
    pub fn new(base_url: Url, repository_id: impl Into<String>) -> Self {
        Self {
            base_url,
            repository_id: repository_id.into(),
        }
    }

    /// Returns the URL artifacts are deployed to for this repository.
    ///
    /// # Examples
    ///
    /// ```
    /// use nexus_staging::StagingRepositoryDescriptor;
    /// use url::Url;
    ///
    /// let base = Url::parse("https://nexus.example.com/service/local/").unwrap();
    /// let descriptor = StagingRepositoryDescriptor::new(base, "orgexample-1001");
    /// assert_eq!(
    ///     descriptor.staging_repository_url(),
    ///     "https://nexus.example.com/service/local/staging/deployByRepositoryId/orgexample-1001"
    /// );
    /// ```
    #[must_use]
    pub fn staging_repository_url(&self) -> String {
        format!(
            "{}staging/deployByRepositoryId/{}",
            self.base_url, self.repository_id
        )
    }
}

impl std::fmt::Display for StagingRepositoryDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.repository_id, self.base_url)
    }
}
