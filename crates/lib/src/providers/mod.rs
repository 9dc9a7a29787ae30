//! Capability providers consumed by the message pipeline.
//!
//! Each capability is a narrow async trait so any backend (in-process heuristic,
//! local LLM server, test fake) can be substituted. Implementations must be safe
//! to call from concurrent requests; none of them hold per-request state.

mod builtin;
mod llm;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::language::{Direction, Language};
use crate::llm::LlmError;

pub use builtin::{LexiconSentiment, StopwordDetector};
pub use llm::{LlmDetector, LlmGenerator, LlmSentiment, LlmTranslation};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0}")]
    Llm(#[from] LlmError),
    #[error("malformed model output: {0}")]
    Malformed(String),
}

/// Sentiment label and confidence. Serialized as `{ "sentiment", "score" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    #[serde(rename = "sentiment")]
    pub label: String,
    pub score: f32,
}

#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// All candidates, most likely first. Never empty.
    async fn rank(&self, text: &str) -> Result<Vec<Language>, ProviderError>;

    /// The single most likely language.
    async fn detect(&self, text: &str) -> Result<Language, ProviderError> {
        let ranked = self.rank(text).await?;
        ranked
            .first()
            .copied()
            .ok_or_else(|| ProviderError::Malformed("detector returned no candidates".to_string()))
    }
}

#[async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(&self, text: &str) -> Result<SentimentResult, ProviderError>;
}

/// Raw translation for one supported direction. May fail; the identity fallback lives in `Translator`.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn translate(&self, text: &str, direction: Direction) -> Result<String, ProviderError>;
}

#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// One bounded-length reply. Never empty on success.
    async fn generate(&self, text: &str) -> Result<String, ProviderError>;
}
