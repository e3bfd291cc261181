//! Chat model clients
//!
//! The generator talks to the model through [`ChatModel`]; the shipped
//! implementation targets an Azure OpenAI chat deployment.

mod azure;
mod error;

pub use azure::AzureChatClient;
pub use error::LlmError;

use async_trait::async_trait;

use crate::models::ChatMessage;

/// A chat model that answers a conversation with one completion.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send `messages` and return the text of the reply.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}
