//! Staging repository states.
//!
//! The staging service reports a repository's lifecycle state as a `type`
//! string (`open`, `closed`, `released`). A repository that no longer exists
//! is represented by [`RepositoryState::NotFound`], which never appears on the
//! wire.

use std::fmt;

use crate::error::{Result, StagingError};

/// Lifecycle state of a staging repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryState {
    /// Accepting uploads.
    Open,

    /// Validated and frozen; ready to be released.
    Closed,

    /// Published to the release repository.
    Released,

    /// The repository id is unknown to the server (e.g. dropped after release).
    NotFound,
}

impl RepositoryState {
    /// Parses a wire `type` value.
    ///
    /// # Examples
    ///
    /// ```
    /// use nexus_staging::RepositoryState;
    ///
    /// assert_eq!(RepositoryState::parse("closed").unwrap(), RepositoryState::Closed);
    /// assert!(RepositoryState::parse("archived").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`StagingError::UnknownState`] for any value that is not a
    /// server-side state, including the `not_found` sentinel.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "released" => Ok(Self::Released),
            _ => Err(StagingError::UnknownState {
                value: value.to_string(),
            }),
        }
    }

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Released => "released",
            Self::NotFound => "not_found",
        }
    }
}

impl fmt::Display for RepositoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed state of a staging repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingRepository {
    /// Repository id.
    pub repository_id: String,

    /// Lifecycle state.
    pub state: RepositoryState,

    /// Whether the server is still applying the last close/release.
    pub transitioning: bool,
}

impl StagingRepository {
    /// Creates a new repository state.
    #[must_use]
    pub fn new(
        repository_id: impl Into<String>,
        state: RepositoryState,
        transitioning: bool,
    ) -> Self {
        Self {
            repository_id: repository_id.into(),
            state,
            transitioning,
        }
    }

    /// State for a repository the server no longer knows about.
    ///
    /// Nothing is left to transition, so `transitioning` is always false.
    #[must_use]
    pub fn not_found(repository_id: impl Into<String>) -> Self {
        Self::new(repository_id, RepositoryState::NotFound, false)
    }

    /// Returns true if the repository no longer exists server-side.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.state == RepositoryState::NotFound
    }
}

impl fmt::Display for StagingRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}", self.repository_id, self.state)?;
        if self.transitioning {
            f.write_str(", transitioning")?;
        }
        f.write_str(")")
    }
}
