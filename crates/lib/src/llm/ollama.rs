//! Ollama API client (http://127.0.0.1:11434 by default).
//! Non-streaming chat only; every capability call is a single request/response.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatMessage, ChatResponse, LlmBackend, LlmError};

pub(crate) const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";

/// Client for Ollama HTTP API.
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum OllamaError {
    #[error("ollama request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("ollama api error: {0}")]
    Api(String),
}

impl OllamaClient {
    pub fn new(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self, OllamaError> {
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

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /api/tags — list available models.
    pub async fn list_models(&self) -> Result<Vec<OllamaModel>, OllamaError> {
        let url = format!("{}/api/tags", self.base_url);
        let res = self.client.get(&url).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(OllamaError::Api(format!("{} {}", status, body)));
        }
        let data: TagsResponse = res.json().await?;
        Ok(data.models.unwrap_or_default())
    }

    /// POST /api/chat — non-streaming chat completion. `max_tokens` maps to `options.num_predict`.
    pub async fn chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        max_tokens: Option<u32>,
    ) -> Result<ChatResponse, OllamaError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model: model.to_string(),
            messages,
            stream: false,
            options: max_tokens.map(|n| ChatOptions { num_predict: n }),
        };
        let res = self.client.post(&url).json(&body).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(OllamaError::Api(format!("{} {}", status, body)));
        }
        let data: ChatResponse = res.json().await?;
        Ok(data)
    }
}

#[async_trait]
impl LlmBackend for OllamaClient {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let models = OllamaClient::list_models(self).await?;
        Ok(models.into_iter().map(|m| m.name).collect())
    }

    async fn chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        max_tokens: Option<u32>,
    ) -> Result<ChatResponse, LlmError> {
        Ok(OllamaClient::chat(self, model, messages, max_tokens).await?)
    }

    /// Ollama resolves a bare name to its `:latest` tag.
    fn has_model(&self, available: &[String], model: &str) -> bool {
        available
            .iter()
            .any(|n| n == model || (!model.contains(':') && *n == format!("{}:latest", model)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaModel {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Option<Vec<OllamaModel>>,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let c = OllamaClient::new(Some("http://host:11434/".to_string()), None).unwrap();
        assert_eq!(c.base_url(), "http://host:11434");
    }

    #[test]
    fn bare_model_name_matches_latest_tag() {
        let c = OllamaClient::new(None, None).unwrap();
        let available = vec!["llama3.2:latest".to_string(), "qwen3:8b".to_string()];
        assert!(c.has_model(&available, "llama3.2"));
        assert!(c.has_model(&available, "qwen3:8b"));
        assert!(!c.has_model(&available, "qwen3"));
    }

    #[test]
    fn chat_response_reads_message_and_ignores_status_fields() {
        let data: ChatResponse = serde_json::from_str(
            r#"{"model":"m","message":{"role":"assistant","content":"Ciao"},"done":true,"eval_count":3}"#,
        )
        .unwrap();
        assert_eq!(data.content(), "Ciao");

        let data: ChatResponse = serde_json::from_str(r#"{"done":false}"#).unwrap();
        assert_eq!(data.content(), "");
    }

    #[test]
    fn chat_request_sends_num_predict_only_when_set() {
        let body = ChatRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage::user("hi")],
            stream: false,
            options: None,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert!(v.get("options").is_none());

        let body = ChatRequest {
            options: Some(ChatOptions { num_predict: 100 }),
            ..body
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["options"]["num_predict"], 100);
    }
}
