//! In-process fake of the Nexus staging endpoints.
//!
//! Every request is recorded. Responses come from canned profiles and
//! repositories, per-path overrides and per-repository state scripts whose
//! last entry repeats.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};

use nexus_staging::{RetryConfig, StagingAuth, StagingClient, StagingConfig};

/// Path prefix the fake serves under, as Nexus 2 does.
pub const SERVICE_PATH: &str = "/service/local";

pub const USERNAME: &str = "deployer";
pub const PASSWORD: &str = "secret";
pub const USER_AGENT: &str = "nexus-staging-tests";

/// A request received by the fake.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Default)]
struct Inner {
    profiles: Vec<Value>,
    repositories: HashMap<String, Vec<Value>>,
    overrides: HashMap<String, (StatusCode, String)>,
    scripts: HashMap<String, VecDeque<(StatusCode, String)>>,
    created: u32,
    requests: Vec<Recorded>,
}

/// Handle on a running or configurable fake server.
#[derive(Clone, Default)]
pub struct FakeNexus {
    inner: Arc<Mutex<Inner>>,
}

impl FakeNexus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, id: &str, name: &str) -> Self {
        self.inner
            .lock()
            .profiles
            .push(json!({ "id": id, "name": name, "mode": "DEPLOY" }));
        self
    }

    pub fn with_repository(
        self,
        profile_id: &str,
        repository_id: &str,
        description: Option<&str>,
    ) -> Self {
        let mut repository = repository_json(repository_id, "open", false);
        if let Some(description) = description {
            repository["description"] = json!(description);
        }
        self.inner
            .lock()
            .repositories
            .entry(profile_id.to_string())
            .or_default()
            .push(repository);
        self
    }

    /// Answers every request to `path` (below the service prefix) with a fixed response.
    pub fn with_override(self, path: &str, status: u16, body: &str) -> Self {
        self.inner.lock().overrides.insert(
            format!("{SERVICE_PATH}/{path}"),
            (status_code(status), body.to_string()),
        );
        self
    }

    /// Scripts the answers of `GET staging/repository/{id}`.
    pub fn with_state_script<'a>(
        self,
        repository_id: &str,
        answers: impl IntoIterator<Item = (u16, &'a str)>,
    ) -> Self {
        let script = answers
            .into_iter()
            .map(|(status, body)| (status_code(status), body.to_string()))
            .collect();
        self.inner
            .lock()
            .scripts
            .insert(repository_id.to_string(), script);
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.lock().requests.clone()
    }

    /// Paths of all requests, without the service prefix.
    pub fn paths(&self) -> Vec<String> {
        self.inner
            .lock()
            .requests
            .iter()
            .map(|r| format!("{} {}", r.method, r.path.trim_start_matches(SERVICE_PATH)))
            .collect()
    }

    pub fn count(&self, method: Method, suffix: &str) -> usize {
        self.inner
            .lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path.ends_with(suffix))
            .count()
    }

    /// Starts serving on an ephemeral port and returns the service base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/service/local/staging/profiles", get(profiles))
            .route(
                "/service/local/staging/profile_repositories/:profile_id",
                get(profile_repositories),
            )
            .route("/service/local/staging/profiles/:profile_id/start", post(start))
            .route("/service/local/staging/bulk/:operation", post(bulk))
            .route("/service/local/staging/repository/:repository_id", get(repository))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}{SERVICE_PATH}")
    }

    /// Records the request and returns the override for its path, if any.
    fn record(
        &self,
        method: Method,
        uri: &Uri,
        headers: HeaderMap,
        body: &Bytes,
    ) -> Option<Response> {
        let mut inner = self.inner.lock();
        inner.requests.push(Recorded {
            method,
            path: uri.path().to_string(),
            headers,
            body: serde_json::from_slice(body).unwrap_or(Value::Null),
        });
        inner
            .overrides
            .get(uri.path())
            .map(|(status, body)| (*status, body.clone()).into_response())
    }
}

/// JSON of a repository as the state and listing endpoints return it.
pub fn repository_json(repository_id: &str, kind: &str, transitioning: bool) -> Value {
    json!({
        "profileId": "ignored",
        "repositoryId": repository_id,
        "type": kind,
        "transitioning": transitioning,
        "policy": "release",
    })
}

/// Body of a successful state read.
pub fn state_body(repository_id: &str, kind: &str, transitioning: bool) -> String {
    repository_json(repository_id, kind, transitioning).to_string()
}

/// Body of the 404 Nexus sends once a repository is gone.
pub fn missing_body(repository_id: &str) -> String {
    format!("No such repository: {repository_id}")
}

/// Client against `base_url` with basic credentials and the test user agent.
pub fn client(base_url: &str) -> StagingClient {
    let config = StagingConfig::new(base_url)
        .with_auth(StagingAuth::basic(USERNAME, PASSWORD))
        .with_user_agent(USER_AGENT)
        .with_timeout(Duration::from_secs(5))
        .with_connect_timeout(Duration::from_secs(5));
    StagingClient::new(config).unwrap()
}

/// Polling budget small enough for tests.
pub fn retry(max_attempts: u32) -> RetryConfig {
    RetryConfig::builder()
        .max_attempts(max_attempts)
        .delay(Duration::from_millis(5))
        .build()
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap()
}

async fn profiles(
    State(fake): State<FakeNexus>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = fake.record(method, &uri, headers, &Bytes::new()) {
        return response;
    }
    let profiles = fake.inner.lock().profiles.clone();
    axum::Json(json!({ "data": profiles })).into_response()
}

async fn profile_repositories(
    State(fake): State<FakeNexus>,
    Path(profile_id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = fake.record(method, &uri, headers, &Bytes::new()) {
        return response;
    }
    let repositories = fake
        .inner
        .lock()
        .repositories
        .get(&profile_id)
        .cloned()
        .unwrap_or_default();
    axum::Json(json!({ "data": repositories })).into_response()
}

async fn start(
    State(fake): State<FakeNexus>,
    Path(profile_id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(response) = fake.record(method, &uri, headers, &body) {
        return response;
    }
    let created = {
        let mut inner = fake.inner.lock();
        inner.created += 1;
        inner.created
    };
    let repository_id = format!("{}-{}", profile_id.to_lowercase(), 1000 + created);
    (
        StatusCode::CREATED,
        axum::Json(json!({ "data": { "stagedRepositoryId": repository_id } })),
    )
        .into_response()
}

async fn bulk(
    State(fake): State<FakeNexus>,
    Path(_operation): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(response) = fake.record(method, &uri, headers, &body) {
        return response;
    }
    StatusCode::CREATED.into_response()
}

async fn repository(
    State(fake): State<FakeNexus>,
    Path(repository_id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = fake.record(method, &uri, headers, &Bytes::new()) {
        return response;
    }
    let answer = {
        let mut inner = fake.inner.lock();
        inner.scripts.get_mut(&repository_id).and_then(|script| {
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        })
    };
    match answer {
        Some((status, body)) => (status, body).into_response(),
        None => (StatusCode::NOT_FOUND, missing_body(&repository_id)).into_response(),
    }
}
