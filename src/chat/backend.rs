//! Backend collaborator: the conversational service behind `POST /chat`.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use url::Url;

use crate::chat::config::ChatConfig;
use crate::chat::error::{ChatError, ChatResult};
use crate::chat::types::ChatRequest;

/// Anything able to answer a chat request with a raw JSON payload.
///
/// Implementations report every failure (status, transport, undecodable
/// body) as an error; interpretation of a successful payload is not their
/// concern.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one request and return the decoded response body.
    async fn send(&self, request: &ChatRequest) -> ChatResult<Value>;
}

/// HTTP implementation posting JSON to the configured endpoint.
pub struct HttpChatBackend {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpChatBackend {
    /// Create a backend client with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client cannot be built.
    pub fn new(config: &ChatConfig) -> ChatResult<Self> {
        config.validate()?;
        let endpoint = config.chat_endpoint()?;
        let client = Self::build_client(config)?;
        Ok(Self { client, endpoint })
    }

    /// Endpoint requests are posted to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn build_client(config: &ChatConfig) -> ChatResult<reqwest::Client> {
        let mut headers = HeaderMap::new();

        if let Ok(ua) = HeaderValue::from_str(&config.user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        builder
            .build()
            .map_err(|e| ChatError::HttpClient(e.to_string()))
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, request: &ChatRequest) -> ChatResult<Value> {
        tracing::debug!(endpoint = %self.endpoint, mode = %request.mode, "posting chat request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        let payload: Value = serde_json::from_slice(&body)?;
        Ok(payload)
    }
}
