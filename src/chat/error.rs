//! Error types for the chat core.

use thiserror::Error;

/// Errors that can occur while talking to the backend or loading configuration.
///
/// None of these ever reach the transcript as-is: the submission controller
/// folds every failure into the fixed failure reply.
#[derive(Debug, Error)]
pub enum ChatError {
    /// HTTP request failed (connection, TLS, body decoding).
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Backend answered with a non-success status.
    #[error("backend returned status {0}")]
    HttpStatus(u16),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    /// Whether the failure happened before any HTTP status was received.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::HttpRequest(_) | Self::Io(_))
    }

    /// Status code returned by the backend, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus(code) => Some(*code),
            _ => None,
        }
    }
}

/// Convenience result alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;
