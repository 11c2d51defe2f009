//! Scripted in-memory [`StagingApi`] for unit tests.
//!
//! [`MockStagingApi`] records every call and answers state reads from a
//! per-repository script. When a script runs dry the last entry repeats.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use regex::Regex;
use url::Url;

use crate::client::StagingApi;
use crate::descriptor::StagingRepositoryDescriptor;
use crate::error::{Result, StagingError};
use crate::profile::select_profile;
use crate::state::{RepositoryState, StagingRepository};
use crate::wire::StagingProfile;

/// One scripted answer to a state read.
#[derive(Debug, Clone)]
pub enum Poll {
    /// The repository in the given state.
    State(RepositoryState, bool),
    /// The repository is gone.
    NotFound,
    /// The service answers 503.
    Unavailable,
}

impl Poll {
    pub const fn transitioning(state: RepositoryState) -> Self {
        Self::State(state, true)
    }

    pub const fn settled(state: RepositoryState) -> Self {
        Self::State(state, false)
    }
}

#[derive(Debug, Default)]
pub struct MockStagingApi {
    profiles: Vec<StagingProfile>,
    repositories: Vec<(String, String, String)>,
    scripts: Mutex<HashMap<String, VecDeque<Poll>>>,
    calls: Mutex<Vec<String>>,
    created: Mutex<u32>,
}

impl MockStagingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, id: &str, name: &str) -> Self {
        self.profiles.push(StagingProfile::new(id, name));
        self
    }

    /// Adds an existing repository `(profile_id, repository_id, description)`.
    pub fn with_repository(
        mut self,
        profile_id: &str,
        repository_id: &str,
        description: &str,
    ) -> Self {
        self.repositories.push((
            profile_id.to_string(),
            repository_id.to_string(),
            description.to_string(),
        ));
        self
    }

    pub fn with_script(self, repository_id: &str, polls: impl IntoIterator<Item = Poll>) -> Self {
        self.scripts
            .lock()
            .insert(repository_id.to_string(), polls.into_iter().collect());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn base_url() -> Url {
        Url::parse("https://nexus.example.com/service/local/").expect("static url")
    }
}

#[async_trait]
impl StagingApi for MockStagingApi {
    async fn find_staging_profile_id(&self, package_group: &str) -> Result<Option<String>> {
        self.record(format!("profile:{package_group}"));
        Ok(select_profile(&self.profiles, package_group).map(|p| p.id.clone()))
    }

    async fn find_staging_repository(
        &self,
        profile_id: &str,
        description_pattern: &Regex,
    ) -> Result<StagingRepositoryDescriptor> {
        self.record(format!("find:{profile_id}"));
        let mut matching: Vec<String> = self
            .repositories
            .iter()
            .filter(|(profile, _, description)| {
                profile == profile_id && description_pattern.is_match(description)
            })
            .map(|(_, id, _)| id.clone())
            .collect();

        match matching.len() {
            0 => Err(StagingError::RepositoryNotFound {
                profile_id: profile_id.to_string(),
                pattern: description_pattern.to_string(),
            }),
            1 => Ok(StagingRepositoryDescriptor::new(Self::base_url(), matching.remove(0))),
            _ => Err(StagingError::AmbiguousMatch {
                profile_id: profile_id.to_string(),
                pattern: description_pattern.to_string(),
                repository_ids: matching,
            }),
        }
    }

    async fn create_staging_repository(
        &self,
        profile_id: &str,
        _description: &str,
    ) -> Result<StagingRepositoryDescriptor> {
        self.record(format!("create:{profile_id}"));
        let mut created = self.created.lock();
        *created += 1;
        Ok(StagingRepositoryDescriptor::new(
            Self::base_url(),
            format!("{profile_id}-{}", 1000 + *created),
        ))
    }

    async fn close_staging_repository(
        &self,
        repository_id: &str,
        _description: &str,
    ) -> Result<()> {
        self.record(format!("close:{repository_id}"));
        Ok(())
    }

    async fn release_staging_repository(
        &self,
        repository_id: &str,
        _description: &str,
    ) -> Result<()> {
        self.record(format!("release:{repository_id}"));
        Ok(())
    }

    async fn drop_staging_repository(
        &self,
        repository_id: &str,
        _description: &str,
    ) -> Result<()> {
        self.record(format!("drop:{repository_id}"));
        Ok(())
    }

    async fn get_staging_repository_state(
        &self,
        repository_id: &str,
    ) -> Result<StagingRepository> {
        self.record(format!("state:{repository_id}"));
        let poll = {
            let mut scripts = self.scripts.lock();
            let script = scripts.entry(repository_id.to_string()).or_default();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        };

        match poll {
            Some(Poll::State(state, transitioning)) => Ok(StagingRepository::new(
                repository_id,
                state,
                transitioning,
            )),
            Some(Poll::NotFound) => Ok(StagingRepository::not_found(repository_id)),
            Some(Poll::Unavailable) => Err(StagingError::RemoteOperationFailure {
                action: "get staging repository state".to_string(),
                url: format!("{}staging/repository/{repository_id}", Self::base_url()),
                status: 503,
                body: None,
                body_error: None,
            }),
            None => Err(StagingError::RemoteOperationFailure {
                action: "get staging repository state".to_string(),
                url: format!("{}staging/repository/{repository_id}", Self::base_url()),
                status: 404,
                body: Some("no script".to_string()),
                body_error: None,
            }),
        }
    }
}
