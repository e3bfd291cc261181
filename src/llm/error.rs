//! Chat model error types

use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to a chat model
#[derive(Debug, Error)]
pub enum LlmError {
    /// The client cannot be built from the given settings
    #[error("Invalid chat model configuration: {0}")]
    Config(String),

    /// Transport failure (connect, timeout, TLS, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Chat completions request failed with status {status}: {body}")]
    Status {
        status: u16,
        body: String,
        retry_after: Option<Duration>,
    },

    /// The response body is not a chat completion
    #[error("Invalid chat completion response: {0}")]
    InvalidResponse(String),

    /// The completion carried no text
    #[error("Chat completion returned no content")]
    EmptyResponse,
}

impl LlmError {
    /// Whether sending the same request again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(e) => !e.is_builder() && !e.is_decode(),
            LlmError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Delay requested by the service through `Retry-After`.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
