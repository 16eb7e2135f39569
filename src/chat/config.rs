//! Configuration for the chat backend client and its hosts.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::chat::error::{ChatError, ChatResult};
use crate::chat::types::Mode;

/// Environment variable holding the backend base URL.
pub const BACKEND_URL_ENV: &str = "LEARNING_ASSISTANT_BACKEND_URL";
/// Environment variable overriding the chat path.
pub const CHAT_PATH_ENV: &str = "LEARNING_ASSISTANT_CHAT_PATH";
/// Environment variable holding an optional whole-request timeout in seconds.
pub const REQUEST_TIMEOUT_ENV: &str = "LEARNING_ASSISTANT_REQUEST_TIMEOUT_SECS";
/// Environment variable holding the connect timeout in seconds.
pub const CONNECT_TIMEOUT_ENV: &str = "LEARNING_ASSISTANT_CONNECT_TIMEOUT_SECS";
/// Environment variable holding the initial mode for terminal sessions.
pub const MODE_ENV: &str = "LEARNING_ASSISTANT_MODE";

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_CHAT_PATH: &str = "/chat";

/// Configuration for the backend client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Base URL of the conversational backend.
    pub backend_url: String,
    /// Path of the chat endpoint, joined onto `backend_url`.
    pub chat_path: String,
    /// Whole-request timeout. `None` keeps the transport default.
    #[serde(default, with = "option_duration_serde")]
    pub request_timeout: Option<Duration>,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
    /// Mode selected when a host does not choose one.
    pub default_mode: Mode,
    /// User agent sent to the backend.
    pub user_agent: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            request_timeout: None,
            connect_timeout: Duration::from_secs(10),
            default_mode: Mode::Internal,
            user_agent: format!("learning-assistant/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ChatConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_env() -> ChatResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Unset keys keep their defaults.
    ///
    /// # Errors
    /// Returns an error if a value cannot be parsed or the result fails validation.
    pub fn from_lookup<F>(lookup: F) -> ChatResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(BACKEND_URL_ENV) {
            config.backend_url = url;
        }
        if let Some(path) = lookup(CHAT_PATH_ENV) {
            config.chat_path = path;
        }
        if let Some(raw) = lookup(REQUEST_TIMEOUT_ENV) {
            config.request_timeout = Some(parse_seconds(REQUEST_TIMEOUT_ENV, &raw)?);
        }
        if let Some(raw) = lookup(CONNECT_TIMEOUT_ENV) {
            config.connect_timeout = parse_seconds(CONNECT_TIMEOUT_ENV, &raw)?;
        }
        if let Some(raw) = lookup(MODE_ENV) {
            config.default_mode = raw
                .parse()
                .map_err(|value| ChatError::Config(format!("{MODE_ENV}: unknown mode {value:?}")))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the backend base URL.
    #[must_use]
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    /// Set the chat endpoint path.
    #[must_use]
    pub fn with_chat_path(mut self, path: impl Into<String>) -> Self {
        self.chat_path = path.into();
        self
    }

    /// Set a whole-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the default mode.
    #[must_use]
    pub const fn with_default_mode(mut self, mode: Mode) -> Self {
        self.default_mode = mode;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the endpoint cannot be built or a timeout is zero.
    pub fn validate(&self) -> ChatResult<()> {
        self.chat_endpoint()?;

        if self.connect_timeout.is_zero() {
            return Err(ChatError::Config(
                "connect_timeout must be > 0".to_string(),
            ));
        }

        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ChatError::Config(
                "request_timeout must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Full URL of the chat endpoint.
    ///
    /// # Errors
    /// Returns an error if the base URL or path is malformed.
    pub fn chat_endpoint(&self) -> ChatResult<Url> {
        let base = Url::parse(&self.backend_url)?;
        if base.cannot_be_a_base() {
            return Err(ChatError::Config(format!(
                "backend_url is not a base URL: {}",
                self.backend_url
            )));
        }
        let path = self.chat_path.trim_start_matches('/');
        let mut joined = base;
        {
            let current = joined.path().trim_end_matches('/').to_string();
            joined.set_path(&format!("{current}/{path}"));
        }
        Ok(joined)
    }
}

fn parse_seconds(key: &str, raw: &str) -> ChatResult<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ChatError::Config(format!("{key}: {e}")))
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Serde module for optional Duration serialization.
mod option_duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.map(|d| d.as_secs()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
