//! HTTP client for the staging REST API.
//!
//! [`StagingApi`] is the set of operations the rest of the crate depends on;
//! [`StagingClient`] implements it over `reqwest`.

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::{StagingAuth, StagingConfig};
use crate::descriptor::StagingRepositoryDescriptor;
use crate::error::{Result, StagingError};
use crate::profile::select_profile;
use crate::state::StagingRepository;
use crate::wire::{
    Dto, RepositoryPayload, StagingProfile, StartRequest, StartResponse, TransitionRequest,
};

const APPLICATION_JSON: &str = "application/json";

/// Operations offered by a staging service.
#[async_trait]
pub trait StagingApi: Send + Sync {
    /// Finds the id of the most specific staging profile covering `package_group`.
    async fn find_staging_profile_id(&self, package_group: &str) -> Result<Option<String>>;

    /// Finds the single repository of a profile whose description matches `description_pattern`.
    async fn find_staging_repository(
        &self,
        profile_id: &str,
        description_pattern: &Regex,
    ) -> Result<StagingRepositoryDescriptor>;

    /// Creates a new staging repository in the profile.
    async fn create_staging_repository(
        &self,
        profile_id: &str,
        description: &str,
    ) -> Result<StagingRepositoryDescriptor>;

    /// Requests the repository to be closed.
    async fn close_staging_repository(&self, repository_id: &str, description: &str)
        -> Result<()>;

    /// Requests the repository to be released (promoted).
    async fn release_staging_repository(
        &self,
        repository_id: &str,
        description: &str,
    ) -> Result<()>;

    /// Requests the repository to be dropped.
    async fn drop_staging_repository(&self, repository_id: &str, description: &str) -> Result<()>;

    /// Reads the current state of the repository.
    ///
    /// A repository the server no longer knows is reported as
    /// [`RepositoryState::NotFound`](crate::RepositoryState::NotFound), not as an error.
    async fn get_staging_repository_state(&self, repository_id: &str)
        -> Result<StagingRepository>;
}

/// Client for a Nexus-style staging service.
#[derive(Debug)]
pub struct StagingClient {
    base_url: Url,
    headers: HeaderMap,
    http: reqwest::Client,
}

impl StagingClient {
    /// Creates a new staging client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the credentials cannot be
    /// encoded or the HTTP client cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use nexus_staging::{StagingClient, StagingConfig};
    ///
    /// let config = StagingConfig::new("https://oss.example.com/service/local/");
    /// let client = StagingClient::new(config)?;
    /// # Ok::<(), nexus_staging::StagingError>(())
    /// ```
    pub fn new(config: StagingConfig) -> Result<Self> {
        let base_url = Self::normalize_base_url(&config.url)?;
        let headers = Self::auth_headers(&config.auth)?;
        let http = Self::build_http_client(&config)?;

        Ok(Self {
            base_url,
            headers,
            http,
        })
    }

    /// Returns the normalised base URL every endpoint is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the HTTP client with timeouts and user agent.
    fn build_http_client(config: &StagingConfig) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|source| StagingError::ClientBuild { source })
    }

    /// Creates authentication headers based on configuration.
    fn auth_headers(auth: &StagingAuth) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        if let StagingAuth::Basic { username, password } = auth {
            let credentials = base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                format!("{username}:{password}"),
            );
            let mut value = HeaderValue::from_str(&format!("Basic {credentials}"))
                .map_err(|_| StagingError::InvalidCredentials)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    /// Parses the base URL and makes sure relative endpoints resolve beneath it.
    fn normalize_base_url(raw: &str) -> Result<Url> {
        let invalid = || StagingError::InvalidUrl {
            url: raw.to_string(),
        };

        let mut url = Url::parse(raw.trim()).map_err(|_| invalid())?;
        if url.cannot_be_a_base() {
            return Err(invalid());
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Resolves an endpoint below the base URL, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StagingError::InvalidUrl {
                url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, action: &str, url: Url) -> Result<Response> {
        tracing::debug!(%url, action, "GET");
        self.http
            .get(url)
            .headers(self.headers.clone())
            .header(ACCEPT, APPLICATION_JSON)
            .send()
            .await
            .map_err(|e| StagingError::transport(action, e))
    }

    async fn post<B: Serialize + Sync>(
        &self,
        action: &str,
        url: Url,
        body: &B,
    ) -> Result<Response> {
        tracing::debug!(%url, action, "POST");
        self.http
            .post(url)
            .headers(self.headers.clone())
            .header(ACCEPT, APPLICATION_JSON)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .json(body)
            .send()
            .await
            .map_err(|e| StagingError::transport(action, e))
    }

    /// GETs `url` and decodes a successful JSON response.
    async fn get_json<T: DeserializeOwned>(&self, action: &str, url: Url) -> Result<T> {
        let response = self.get(action, url.clone()).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::failure(action, &url, status, response.text().await));
        }
        Self::decode(action, response).await
    }

    /// POSTs a transition request and expects any successful status.
    async fn post_transition(
        &self,
        action: &str,
        operation: &str,
        request: &TransitionRequest<'_>,
    ) -> Result<()> {
        let url = self.endpoint(&["staging", "bulk", operation])?;
        let response = self.post(action, url.clone(), &Dto::new(request)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::failure(action, &url, status, response.text().await));
        }
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(action: &str, response: Response) -> Result<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StagingError::transport(action, e))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(StagingError::MissingResponseBody {
                action: action.to_string(),
            });
        }

        serde_json::from_slice(&bytes).map_err(|source| StagingError::MalformedResponse {
            action: action.to_string(),
            source,
        })
    }

    /// Builds the failure for an unsuccessful response.
    ///
    /// A body that cannot be read is recorded as a note; it never replaces
    /// the status failure itself.
    fn failure(
        action: &str,
        url: &Url,
        status: StatusCode,
        body: std::result::Result<String, reqwest::Error>,
    ) -> StagingError {
        let (body, body_error) = match body {
            Ok(text) if text.trim().is_empty() => (None, None),
            Ok(text) => (Some(text), None),
            Err(e) => (None, Some(e.to_string())),
        };

        StagingError::RemoteOperationFailure {
            action: action.to_string(),
            url: url.to_string(),
            status: status.as_u16(),
            body,
            body_error,
        }
    }

    fn descriptor(&self, repository_id: impl Into<String>) -> StagingRepositoryDescriptor {
        StagingRepositoryDescriptor::new(self.base_url.clone(), repository_id)
    }
}

#[async_trait]
impl StagingApi for StagingClient {
    async fn find_staging_profile_id(&self, package_group: &str) -> Result<Option<String>> {
        let action = "load staging profiles";
        let url = self.endpoint(&["staging", "profiles"])?;
        let profiles: Dto<Vec<StagingProfile>> = self.get_json(action, url).await?;

        let selected = select_profile(&profiles.data, package_group).map(|p| p.id.clone());
        tracing::debug!(
            package_group,
            profiles = profiles.data.len(),
            profile_id = ?selected,
            "Selected staging profile"
        );
        Ok(selected)
    }

    async fn find_staging_repository(
        &self,
        profile_id: &str,
        description_pattern: &Regex,
    ) -> Result<StagingRepositoryDescriptor> {
        let action = "load staging repositories";
        let url = self.endpoint(&["staging", "profile_repositories", profile_id])?;
        let repositories: Dto<Vec<RepositoryPayload>> = self.get_json(action, url).await?;

        let mut matching: Vec<String> = repositories
            .data
            .into_iter()
            .filter(|repo| {
                repo.description
                    .as_deref()
                    .is_some_and(|description| description_pattern.is_match(description))
            })
            .map(|repo| repo.repository_id)
            .collect();

        match matching.len() {
            0 => Err(StagingError::RepositoryNotFound {
                profile_id: profile_id.to_string(),
                pattern: description_pattern.to_string(),
            }),
            1 => Ok(self.descriptor(matching.remove(0))),
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
        description: &str,
    ) -> Result<StagingRepositoryDescriptor> {
        let action = "create staging repository";
        let url = self.endpoint(&["staging", "profiles", profile_id, "start"])?;
        let response = self
            .post(action, url.clone(), &Dto::new(StartRequest { description }))
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::failure(action, &url, status, response.text().await));
        }

        let created: Dto<StartResponse> = Self::decode(action, response).await?;
        let repository_id = created
            .data
            .staged_repository_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StagingError::MissingResponseBody {
                action: action.to_string(),
            })?;

        tracing::info!(profile_id, repository_id, "Created staging repository");
        Ok(self.descriptor(repository_id))
    }

    async fn close_staging_repository(
        &self,
        repository_id: &str,
        description: &str,
    ) -> Result<()> {
        self.post_transition(
            "close staging repository",
            "close",
            &TransitionRequest::with_auto_drop(repository_id, description),
        )
        .await
    }

    async fn release_staging_repository(
        &self,
        repository_id: &str,
        description: &str,
    ) -> Result<()> {
        // Release and promote share the endpoint; the server decides based on
        // the repository's own state.
        self.post_transition(
            "release staging repository",
            "promote",
            &TransitionRequest::with_auto_drop(repository_id, description),
        )
        .await
    }

    async fn drop_staging_repository(&self, repository_id: &str, description: &str) -> Result<()> {
        self.post_transition(
            "drop staging repository",
            "drop",
            &TransitionRequest::plain(repository_id, description),
        )
        .await
    }

    async fn get_staging_repository_state(
        &self,
        repository_id: &str,
    ) -> Result<StagingRepository> {
        let action = "get staging repository state";
        let url = self.endpoint(&["staging", "repository", repository_id])?;
        let response = self.get(action, url.clone()).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await;
            let mentions_id = body
                .as_ref()
                .is_ok_and(|text| text.contains(repository_id));
            if status == StatusCode::NOT_FOUND && mentions_id {
                tracing::debug!(repository_id, "Staging repository not found");
                return Ok(StagingRepository::not_found(repository_id));
            }
            return Err(Self::failure(action, &url, status, body));
        }

        let payload: RepositoryPayload = Self::decode(action, response).await?;
        if payload.repository_id != repository_id {
            return Err(StagingError::RepositoryIdMismatch {
                requested: repository_id.to_string(),
                returned: payload.repository_id,
            });
        }

        payload.into_state()
    }
}
