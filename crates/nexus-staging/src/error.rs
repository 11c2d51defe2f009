//! Error types for staging operations.

use thiserror::Error;

use crate::state::{RepositoryState, StagingRepository};

/// Result type alias for staging operations.
pub type Result<T> = std::result::Result<T, StagingError>;

/// Errors that can occur while driving a staging repository.
#[derive(Debug, Error)]
pub enum StagingError {
    /// The staging service answered with an unsuccessful status.
    #[error(
        "Failed to {action}, server at {url} responded with status code {status}{}",
        describe_body(.body, .body_error)
    )]
    RemoteOperationFailure {
        /// Action that was attempted (e.g. "load staging profiles").
        action: String,
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body, if it could be read and was not empty.
        body: Option<String>,
        /// Why the response body could not be read.
        body_error: Option<String>,
    },

    /// The request never produced a response.
    #[error("Failed to {action}: {source}")]
    Transport {
        /// Action that was attempted.
        action: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body did not have the expected shape.
    #[error("Failed to {action}: malformed response: {source}")]
    MalformedResponse {
        /// Action that was attempted.
        action: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The server omitted data the operation depends on.
    #[error("Failed to {action}: server response is missing its body")]
    MissingResponseBody {
        /// Action that was attempted.
        action: String,
    },

    /// No staging profile matches the package group.
    #[error("No staging profile found for package group '{package_group}'")]
    NoMatchingProfile {
        /// Package group that was looked up.
        package_group: String,
    },

    /// No staging repository matches the description pattern.
    #[error(
        "No staging repository with description matching '{pattern}' found in profile {profile_id}"
    )]
    RepositoryNotFound {
        /// Staging profile that was searched.
        profile_id: String,
        /// Description pattern.
        pattern: String,
    },

    /// More than one staging repository matches the description pattern.
    #[error(
        "Found {} staging repositories with description matching '{pattern}' in profile {profile_id}: {}; drop the spurious ones and retry",
        count(.repository_ids),
        join_ids(.repository_ids)
    )]
    AmbiguousMatch {
        /// Staging profile that was searched.
        profile_id: String,
        /// Description pattern.
        pattern: String,
        /// Ids of every matching repository.
        repository_ids: Vec<String>,
    },

    /// The server returned a different repository than the one requested.
    #[error("Requested staging repository {requested} but server returned {returned}")]
    RepositoryIdMismatch {
        /// Requested repository id.
        requested: String,
        /// Repository id found in the response.
        returned: String,
    },

    /// The server reported a repository type this client does not know.
    #[error("Unknown staging repository state '{value}'")]
    UnknownState {
        /// Raw wire value.
        value: String,
    },

    /// Polling ran out of attempts while the repository was still transitioning.
    #[error(
        "Staging repository {repository_id} is still transitioning after {attempts} attempts (last state: {last_state}); server-side validation may still be in progress"
    )]
    RetryBudgetExhausted {
        /// Repository being polled.
        repository_id: String,
        /// Number of state reads performed.
        attempts: u32,
        /// Last observed state.
        last_state: Box<StagingRepository>,
    },

    /// The repository settled, but not in the state the transition aims for.
    #[error(
        "Staging repository {repository_id} settled in state '{actual}' instead of {}; check the repository manager for rule violations (e.g. missing signatures)",
        format_expected(.expected)
    )]
    UnexpectedState {
        /// Repository id.
        repository_id: String,
        /// Acceptable states.
        expected: Vec<RepositoryState>,
        /// Observed state.
        actual: RepositoryState,
    },

    /// No repository target is configured under the logical name.
    #[error("No staging repository configured under the name '{name}'")]
    UnknownRepository {
        /// Logical repository name.
        name: String,
    },

    /// Invalid base URL.
    #[error("Invalid staging service URL: {url}")]
    InvalidUrl {
        /// URL string.
        url: String,
    },

    /// Credentials cannot be encoded as a header value.
    #[error("Invalid credentials for staging service")]
    InvalidCredentials,

    /// Failed to build the HTTP client.
    #[error("Failed to build HTTP client: {source}")]
    ClientBuild {
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
}

impl StagingError {
    /// Wraps a transport error for the given action.
    pub(crate) fn transport(action: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            action: action.to_string(),
            source,
        }
    }

    /// Returns true if the failure is transient and polling may try again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { source, .. } => source.is_timeout() || source.is_connect(),
            Self::RemoteOperationFailure { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }

    /// Returns true if the error reports that nothing matched a lookup.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NoMatchingProfile { .. } | Self::RepositoryNotFound { .. }
        )
    }
}

#[allow(clippy::ref_option)]
fn describe_body(body: &Option<String>, body_error: &Option<String>) -> String {
    match (body, body_error) {
        (Some(body), _) => format!(", body: {body}"),
        (None, Some(note)) => format!(" (failed to read body: {note})"),
        (None, None) => String::new(),
    }
}

fn count(ids: &[String]) -> usize {
    ids.len()
}

fn join_ids(ids: &[String]) -> String {
    ids.join(", ")
}

fn format_expected(expected: &[RepositoryState]) -> String {
    expected
        .iter()
        .map(|state| format!("'{state}'"))
        .collect::<Vec<_>>()
        .join(" or ")
}
