//! Request and response shapes of the staging REST API.
//!
//! Every payload is wrapped in a `{"data": ...}` envelope except the single
//! repository read. Unknown fields are ignored; fields the client depends on
//! are required so a drifting server fails at deserialization.

use serde::{Deserialize, Serialize};

use crate::state::{RepositoryState, StagingRepository};

/// The `{"data": ...}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Dto<T> {
    pub data: T,
}

impl<T> Dto<T> {
    pub(crate) const fn new(data: T) -> Self {
        Self { data }
    }
}

/// Entry of `GET staging/profiles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingProfile {
    /// Profile id.
    pub id: String,

    /// Dot-separated namespace, e.g. `org.example`.
    pub name: String,
}

impl StagingProfile {
    /// Creates a new profile.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Repository as reported by `staging/profile_repositories` and `staging/repository`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RepositoryPayload {
    pub repository_id: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub transitioning: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RepositoryPayload {
    /// Converts into the state model, rejecting unknown `type` values.
    pub(crate) fn into_state(self) -> crate::Result<StagingRepository> {
        let state = RepositoryState::parse(&self.kind)?;
        Ok(StagingRepository::new(
            self.repository_id,
            state,
            self.transitioning,
        ))
    }
}

/// Body of `POST staging/profiles/{id}/start`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct StartRequest<'a> {
    pub description: &'a str,
}

/// Response of `POST staging/profiles/{id}/start`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartResponse {
    #[serde(default)]
    pub staged_repository_id: Option<String>,
}

/// Body of the `staging/bulk/*` transition endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransitionRequest<'a> {
    pub staged_repository_ids: Vec<&'a str>,

    pub description: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_drop_after_release: Option<bool>,
}

impl<'a> TransitionRequest<'a> {
    /// Close and promote requests ask the server to drop the repository once released.
    pub(crate) fn with_auto_drop(repository_id: &'a str, description: &'a str) -> Self {
        Self {
            staged_repository_ids: vec![repository_id],
            description,
            auto_drop_after_release: Some(true),
        }
    }

    pub(crate) fn plain(repository_id: &'a str, description: &'a str) -> Self {
        Self {
            staged_repository_ids: vec![repository_id],
            description,
            auto_drop_after_release: None,
        }
    }
}
