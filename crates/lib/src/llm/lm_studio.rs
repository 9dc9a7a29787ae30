//! LM Studio client over its OpenAI-compatible API (/v1/models, /v1/chat/completions).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatMessage, ChatResponse, LlmBackend, LlmError};

pub(crate) const DEFAULT_BASE_URL: &str = "http://127.0.0.1:1234/v1";

/// Client for LM Studio (OpenAI-compat endpoint).
#[derive(Clone)]
pub struct LmStudioClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum LmStudioError {
    #[error("lm studio request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("lm studio api error: {0}")]
    Api(String),
}

impl LmStudioClient {
    pub fn new(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self, LmStudioError> {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            base_url,
            client: builder.build()?,
        })
    }

    /// GET /v1/models — list available model ids.
    pub async fn list_models(&self) -> Result<Vec<LmStudioModel>, LmStudioError> {
        let url = format!("{}/models", self.base_url);
        let res = self.client.get(&url).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LmStudioError::Api(format!("{} {}", status, body)));
        }
        let data: OpenAiModelsResponse = res.json().await?;
        Ok(data
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|m| LmStudioModel { name: m.id })
            .collect())
    }

    /// POST /v1/chat/completions — non-streaming chat.
    pub async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        max_tokens: Option<u32>,
    ) -> Result<ChatResponse, LmStudioError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = OpenAiChatRequest {
            model: model.to_string(),
            messages: messages_to_openai(messages),
            stream: false,
            max_tokens,
        };
        let res = self.client.post(&url).json(&body).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LmStudioError::Api(format!("{} {}", status, body)));
        }
        let data: OpenAiChatResponse = res.json().await?;
        openai_response_to_chat_response(data)
    }
}

#[async_trait]
impl LlmBackend for LmStudioClient {
    fn name(&self) -> &'static str {
        "lmstudio"
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let models = LmStudioClient::list_models(self).await?;
        Ok(models.into_iter().map(|m| m.name).collect())
    }

    async fn chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        max_tokens: Option<u32>,
    ) -> Result<ChatResponse, LlmError> {
        Ok(LmStudioClient::chat(self, model, &messages, max_tokens).await?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LmStudioModel {
    pub name: String,
}

// --- OpenAI wire types ---

#[derive(Debug, Deserialize)]
struct OpenAiModelsResponse {
    data: Option<Vec<OpenAiModelObject>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiModelObject {
    id: String,
}

#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
enum OpenAiMessage {
    System { content: String },
    User { content: String },
    Assistant { content: String },
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Option<Vec<OpenAiChoice>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn messages_to_openai(messages: &[ChatMessage]) -> Vec<OpenAiMessage> {
    messages
        .iter()
        .map(|m| match m.role.as_str() {
            "system" => OpenAiMessage::System {
                content: m.content.clone(),
            },
            "assistant" => OpenAiMessage::Assistant {
                content: m.content.clone(),
            },
            _ => OpenAiMessage::User {
                content: m.content.clone(),
            },
        })
        .collect()
}

fn openai_response_to_chat_response(
    data: OpenAiChatResponse,
) -> Result<ChatResponse, LmStudioError> {
    let choice = data
        .choices
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| LmStudioError::Api("response had no choices".to_string()))?;
    let content = choice
        .message
        .and_then(|m| m.content)
        .unwrap_or_default();
    Ok(ChatResponse {
        message: Some(ChatMessage::assistant(content)),
    })
}
