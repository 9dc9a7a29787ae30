//! Message pipeline: detect, score, canonicalize to English, generate, back-translate.
//!
//! The pipeline holds no state of its own. Providers come in through an explicitly
//! built `PipelineContext`, so tests can substitute fakes for any capability.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::language::{Language, CANONICAL};
use crate::providers::{LanguageDetector, ProviderError, ResponseGenerator, SentimentScorer};
use crate::translate::Translator;

pub use crate::providers::SentimentResult;

fn default_target_language() -> String {
    CANONICAL.as_str().to_string()
}

/// One inbound chat message. `source_language` is caller-asserted and only logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub text: String,
    pub source_language: String,
    #[serde(default = "default_target_language")]
    pub target_language: String,
}

impl InboundMessage {
    pub fn new(text: impl Into<String>, source_language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.into(),
            target_language: default_target_language(),
        }
    }

    pub fn with_target(mut self, target_language: impl Into<String>) -> Self {
        self.target_language = target_language.into();
        self
    }
}

/// Full result returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedResult {
    pub original_text: String,
    pub detected_language: Language,
    pub sentiment: SentimentResult,
    pub response: String,
}

/// A failed pipeline run. Translation never fails (see `Translator`).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("language detection failed: {0}")]
    Detection(#[source] ProviderError),
    #[error("sentiment analysis failed: {0}")]
    Sentiment(#[source] ProviderError),
    #[error("response generation failed: {0}")]
    Generation(#[source] ProviderError),
}

/// Capability providers, loaded once and shared by every request.
#[derive(Clone)]
pub struct PipelineContext {
    pub detector: Arc<dyn LanguageDetector>,
    pub sentiment: Arc<dyn SentimentScorer>,
    pub translator: Translator,
    pub generator: Arc<dyn ResponseGenerator>,
}

/// Run one message through the pipeline.
pub async fn process(
    ctx: &PipelineContext,
    message: &InboundMessage,
) -> Result<ProcessedResult, PipelineError> {
    let detected = ctx
        .detector
        .detect(&message.text)
        .await
        .map_err(PipelineError::Detection)?;
    log::debug!(
        "pipeline: detected {} (caller said {})",
        detected,
        message.source_language
    );

    let sentiment = ctx
        .sentiment
        .score(&message.text)
        .await
        .map_err(PipelineError::Sentiment)?;

    let canonical = if detected != CANONICAL {
        ctx.translator
            .translate(&message.text, detected.as_str(), CANONICAL.as_str())
            .await
    } else {
        message.text.clone()
    };

    let raw = ctx
        .generator
        .generate(&canonical)
        .await
        .map_err(PipelineError::Generation)?;

    let response = if message.target_language != CANONICAL.as_str() {
        ctx.translator
            .translate(&raw, CANONICAL.as_str(), &message.target_language)
            .await
    } else {
        raw
    };

    Ok(ProcessedResult {
        original_text: message.text.clone(),
        detected_language: detected,
        sentiment,
        response,
    })
}
