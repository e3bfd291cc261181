//! Azure OpenAI chat completions client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatModel, LlmError};
use crate::config::LlmConfig;
use crate::models::ChatMessage;

/// Longest error body kept in [`LlmError::Status`]
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Longest `Retry-After` honoured; longer requests fall back to the backoff
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Client for one Azure OpenAI chat deployment.
pub struct AzureChatClient {
    client: reqwest::Client,
    url: String,
    api_version: String,
    api_key: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_retries: u32,
    retry_backoff: Duration,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl AzureChatClient {
    /// Build a client from validated configuration.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        config
            .validate()
            .map_err(|e| LlmError::Config(e.to_string()))?;

        // validate() guarantees these are present
        let endpoint = config.endpoint.as_deref().unwrap_or_default();
        let deployment = config.deployment.as_deref().unwrap_or_default();
        let api_key = config.api_key.clone().unwrap_or_default();

        let builder = reqwest::Client::builder()
            .user_agent(concat!("pytestgen/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs));
        // tests talk to a loopback server; keep ambient proxy settings out of it
        #[cfg(test)]
        let builder = builder.no_proxy();
        let client = builder.build()?;

        Ok(Self {
            client,
            url: completions_url(endpoint, deployment),
            api_version: config.api_version.clone(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// Chat completions URL, without the `api-version` query.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        self.retry_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    fn retry_delay(&self, err: &LlmError, attempt: u32) -> Duration {
        err.retry_after()
            .filter(|delay| *delay <= MAX_RETRY_AFTER)
            .unwrap_or_else(|| self.backoff_for(attempt))
    }

    async fn send_once(&self, request: &ChatCompletionRequest<'_>) -> Result<String, LlmError> {
        let response = self
            .client
            .post(&self.url)
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY_CHARS),
                retry_after,
            });
        }

        let text = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl ChatModel for AzureChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let request = ChatCompletionRequest {
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut attempt = 0;
        loop {
            tracing::debug!("Chat completion attempt {} to {}", attempt + 1, self.url);
            match self.send_once(&request).await {
                Ok(content) => return Ok(content),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let delay = self.retry_delay(&err, attempt);
                    tracing::warn!(
                        "Chat completion attempt {} failed: {}; retrying in {:?}",
                        attempt + 1,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn completions_url(endpoint: &str, deployment: &str) -> String {
    format!(
        "{}/openai/deployments/{}/chat/completions",
        endpoint.trim().trim_end_matches('/'),
        deployment.trim()
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    let mut truncated: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
