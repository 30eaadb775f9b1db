//! LLM client module for interacting with language models.
//!
//! The gateway only needs a text-in/text-out chat: one system message and one
//! user message in, the assistant text out. Any OpenAI-compatible backend works.

mod error;
mod openai;
mod scripted;

pub use error::{LlmError, RetryPolicy};
pub use openai::OpenAiClient;
pub use scripted::{RecordedCall, ScriptedLlmClient};

use async_trait::async_trait;
use serde::Serialize;

/// Role in a chat conversation.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A message in a chat conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Response from a chat completion.
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    /// Assistant text; `None` when the backend sent no content
    pub content: Option<String>,
}

impl ChatResponse {
    /// Response carrying only assistant text.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
        }
    }
}

/// Trait for LLM clients.
///
/// Implementations must be safe to share across request handlers.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a chat completion request.
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> anyhow::Result<ChatResponse>;
}
