//! LLM backends (Ollama, LM Studio) used by the model-backed capability providers.

mod lm_studio;
mod ollama;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use lm_studio::{LmStudioClient, LmStudioError, LmStudioModel};
pub use ollama::{OllamaClient, OllamaError, OllamaModel};

pub(crate) use lm_studio::DEFAULT_BASE_URL as LM_STUDIO_DEFAULT_BASE_URL;
pub(crate) use ollama::DEFAULT_BASE_URL as OLLAMA_DEFAULT_BASE_URL;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error(transparent)]
    Ollama(#[from] OllamaError),
    #[error(transparent)]
    LmStudio(#[from] LmStudioError),
}

/// A chat-completion backend. Implementations are shared across concurrent requests.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Short backend name for logs and health output.
    fn name(&self) -> &'static str;

    /// Model names the backend can serve right now.
    async fn list_models(&self) -> Result<Vec<String>, LlmError>;

    async fn chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        max_tokens: Option<u32>,
    ) -> Result<ChatResponse, LlmError>;

    /// Whether `model` is among `available` (as returned by `list_models`).
    fn has_model(&self, available: &[String], model: &str) -> bool {
        available.iter().any(|n| n == model)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: Option<ChatMessage>,
}

impl ChatResponse {
    /// Text content of the assistant message, if any.
    pub fn content(&self) -> &str {
        self.message
            .as_ref()
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}
