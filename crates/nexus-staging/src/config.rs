//! Configuration types for the staging client.

use std::time::Duration;

/// Configuration for the staging client.
#[derive(Debug, Clone)]
pub struct StagingConfig {
    /// Staging service URL (e.g., "<https://oss.example.com/service/local/>").
    pub url: String,

    /// Authentication configuration.
    pub auth: StagingAuth,

    /// Overall request timeout.
    pub timeout: Duration,

    /// Connection establishment timeout.
    pub connect_timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl StagingConfig {
    /// Creates a new staging configuration with the given URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use nexus_staging::StagingConfig;
    ///
    /// let config = StagingConfig::new("https://oss.example.com/service/local/");
    /// assert_eq!(config.url, "https://oss.example.com/service/local/");
    /// ```
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth: StagingAuth::None,
            timeout: Duration::from_secs(5 * 60),
            connect_timeout: Duration::from_secs(5 * 60),
            user_agent: format!("nexus-staging/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the authentication method.
    #[must_use]
    pub fn with_auth(mut self, auth: StagingAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Overrides the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Authentication methods for the staging service.
#[derive(Clone)]
pub enum StagingAuth {
    /// Anonymous access.
    None,

    /// Basic authentication (username/password or user token).
    Basic {
        /// Username.
        username: String,
        /// Password or token.
        password: String,
    },
}

impl StagingAuth {
    /// Creates basic authentication.
    ///
    /// # Examples
    ///
    /// ```
    /// use nexus_staging::StagingAuth;
    ///
    /// let auth = StagingAuth::basic("user", "pass");
    /// ```
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Builds basic auth when both halves of the credentials are present.
    #[must_use]
    pub fn from_credentials(username: Option<String>, password: Option<String>) -> Self {
        match (username, password) {
            (Some(username), Some(password)) => Self::Basic { username, password },
            _ => Self::None,
        }
    }
}

impl std::fmt::Debug for StagingAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// How long to wait for an asynchronous transition to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of state reads.
    pub max_attempts: u32,

    /// Delay between state reads.
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Creates a configuration builder.
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    /// Upper bound on the time spent sleeping between attempts.
    #[must_use]
    pub fn max_wait(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }
}

/// Builder for `RetryConfig`.
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    max_attempts: Option<u32>,
    delay: Option<Duration>,
}

impl RetryConfigBuilder {
    /// Sets the maximum number of attempts.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Sets the delay between attempts.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> RetryConfig {
        let defaults = RetryConfig::default();
        RetryConfig {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            delay: self.delay.unwrap_or(defaults.delay),
        }
    }
}
