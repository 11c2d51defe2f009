//! Close and release transitions.
//!
//! A transition is requested once and then polled until the server stops
//! reporting the repository as transitioning:
//!
//! ```text
//! Requested ──► Polling ──┬──► Settled
//!                  ▲  │   ├──► NotFound   (release only)
//!                  └──┘   └──► Exhausted
//! ```
//!
//! Only one transition per repository id runs at a time; a second request for
//! the same id waits until the first has settled or failed.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::client::StagingApi;
use crate::config::RetryConfig;
use crate::error::{Result, StagingError};
use crate::retrier::{ActionRetrier, RetryError};
use crate::state::{RepositoryState, StagingRepository};

/// The asynchronous transitions a staging repository goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// Validate and freeze an open repository.
    Close,

    /// Publish a closed repository.
    Release,
}

impl TransitionKind {
    /// Returns a string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::Release => "release",
        }
    }

    /// States a repository may settle in for the transition to count as done.
    ///
    /// A released repository may already have been dropped by the server.
    #[must_use]
    pub const fn desired_states(&self) -> &'static [RepositoryState] {
        match self {
            Self::Close => &[RepositoryState::Closed],
            Self::Release => &[RepositoryState::Released, RepositoryState::NotFound],
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a completed transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// Transition that was applied.
    pub kind: TransitionKind,

    /// Settled repository state.
    pub repository: StagingRepository,

    /// Number of state reads it took to settle.
    pub attempts: u32,
}

type LockMap = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Drives close and release transitions to completion.
pub struct Transitioner {
    api: Arc<dyn StagingApi>,
    retry: RetryConfig,
    in_flight: LockMap,
}

impl std::fmt::Debug for Transitioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transitioner")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Transitioner {
    /// Creates a transitioner polling with the given budget.
    pub fn new(api: Arc<dyn StagingApi>, retry: RetryConfig) -> Self {
        Self {
            api,
            retry,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Closes the repository and waits until it is closed.
    ///
    /// # Errors
    ///
    /// Fails if the close request fails, polling runs out of attempts
    /// ([`StagingError::RetryBudgetExhausted`]) or the repository settles in
    /// another state ([`StagingError::UnexpectedState`]), typically because
    /// validation rules rejected its content.
    pub async fn effectively_close(
        &self,
        repository_id: &str,
        description: &str,
    ) -> Result<TransitionOutcome> {
        self.transition(TransitionKind::Close, repository_id, description)
            .await
    }

    /// Releases the repository and waits until it is released or dropped.
    ///
    /// # Errors
    ///
    /// As for [`effectively_close`](Self::effectively_close).
    pub async fn effectively_release(
        &self,
        repository_id: &str,
        description: &str,
    ) -> Result<TransitionOutcome> {
        self.transition(TransitionKind::Release, repository_id, description)
            .await
    }

    /// Requests `kind` for the repository and polls until it settles.
    ///
    /// # Errors
    ///
    /// As for [`effectively_close`](Self::effectively_close).
    pub async fn transition(
        &self,
        kind: TransitionKind,
        repository_id: &str,
        description: &str,
    ) -> Result<TransitionOutcome> {
        let entry = InFlight::acquire(&self.in_flight, repository_id);
        let _guard = entry.lock.lock().await;
        self.request_and_poll(kind, repository_id, description)
            .await
    }

    async fn request_and_poll(
        &self,
        kind: TransitionKind,
        repository_id: &str,
        description: &str,
    ) -> Result<TransitionOutcome> {
        tracing::info!(
            repository_id,
            transition = %kind,
            max_attempts = self.retry.max_attempts,
            max_wait = ?self.retry.max_wait(),
            "Requesting transition"
        );
        match kind {
            TransitionKind::Close => {
                self.api
                    .close_staging_repository(repository_id, description)
                    .await?;
            }
            TransitionKind::Release => {
                self.api
                    .release_staging_repository(repository_id, description)
                    .await?;
            }
        }

        // A repository the server has discarded has nothing left to apply.
        let retrier = ActionRetrier::from_config(&self.retry, |repo: &StagingRepository| {
            repo.transitioning && !repo.is_not_found()
        });

        let settled = retrier
            .execute(repository_id, || {
                self.api.get_staging_repository_state(repository_id)
            })
            .await
            .map_err(|err| match err {
                RetryError::Exhausted { last, attempts } => StagingError::RetryBudgetExhausted {
                    repository_id: repository_id.to_string(),
                    attempts,
                    last_state: Box::new(last),
                },
                RetryError::Failed { error, .. } => error,
            })?;

        let repository = settled.value;
        if !kind.desired_states().contains(&repository.state) {
            return Err(StagingError::UnexpectedState {
                repository_id: repository_id.to_string(),
                expected: kind.desired_states().to_vec(),
                actual: repository.state,
            });
        }

        tracing::info!(
            repository_id,
            transition = %kind,
            state = %repository.state,
            attempts = settled.attempts,
            "Transition settled"
        );

        Ok(TransitionOutcome {
            kind,
            repository,
            attempts: settled.attempts,
        })
    }
}

/// Per-repository-id lock entry.
///
/// Dropping it removes the map entry once no other transition holds or waits
/// for the lock, including when the transition future is cancelled.
struct InFlight<'a> {
    locks: &'a LockMap,
    repository_id: &'a str,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl<'a> InFlight<'a> {
    fn acquire(locks: &'a LockMap, repository_id: &'a str) -> Self {
        let lock = Arc::clone(locks.lock().entry(repository_id.to_string()).or_default());
        Self {
            locks,
            repository_id,
            lock,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock();
        // the map and this entry are the only owners left
        if locks.get(self.repository_id).is_some_and(|lock| {
            Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2
        }) {
            locks.remove(self.repository_id);
        }
    }
}
