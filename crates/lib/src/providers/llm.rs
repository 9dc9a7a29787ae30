//! Providers backed by a chat-completion model (Ollama or LM Studio).

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::builtin::{tokens, NEGATORS};
use super::{
    LanguageDetector, ProviderError, ResponseGenerator, SentimentResult, SentimentScorer,
    TranslationBackend,
};
use crate::config::GenerationConfig;
use crate::language::{Direction, Language, CANDIDATES};
use crate::llm::{ChatMessage, LlmBackend};

const DETECT_PROMPT: &str = "Identify the language of the user's message. \
Answer with exactly one word from this list: english, french, spanish, italian.";

const SENTIMENT_PROMPT: &str = "Rate the sentiment of the user's message on a scale of 1 to 5 stars \
(1 = very negative, 3 = neutral, 5 = very positive). Answer with JSON only, for example \
{\"label\": \"4 stars\", \"score\": 0.82}, where score is your confidence between 0 and 1.";

const DEFAULT_CHAT_PROMPT: &str =
    "You are a friendly multilingual chatbot. Reply to the user's message in English, briefly.";

/// Shared handle to a backend plus the model to call on it.
#[derive(Clone)]
struct ModelRef {
    backend: Arc<dyn LlmBackend>,
    model: String,
}

impl ModelRef {
    async fn ask(
        &self,
        system: &str,
        user: &str,
        max_tokens: Option<u32>,
    ) -> Result<String, ProviderError> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let res = self.backend.chat(&self.model, messages, max_tokens).await?;
        Ok(res.content().trim().to_string())
    }
}

/// Zero-shot language classification over the candidate labels.
pub struct LlmDetector {
    model: ModelRef,
}

impl LlmDetector {
    pub fn new(backend: Arc<dyn LlmBackend>, model: impl Into<String>) -> Self {
        Self {
            model: ModelRef {
                backend,
                model: model.into(),
            },
        }
    }
}

/// Candidates ordered by first mention in the reply; unmentioned ones follow in candidate order.
/// Only whole words count, and a label right after a negator ("not english") is skipped.
/// `None` when the reply mentions no candidate at all.
fn rank_from_reply(reply: &str) -> Option<Vec<Language>> {
    let words = tokens(reply);
    let mut ranked: Vec<Language> = Vec::new();
    for (i, word) in words.iter().enumerate() {
        let Some(l) = CANDIDATES.into_iter().find(|l| l.as_str() == word.as_str()) else {
            continue;
        };
        let negated = i > 0 && NEGATORS.contains(&words[i - 1].as_str());
        if !negated && !ranked.contains(&l) {
            ranked.push(l);
        }
    }
    if ranked.is_empty() {
        return None;
    }
    for l in CANDIDATES {
        if !ranked.contains(&l) {
            ranked.push(l);
        }
    }
    Some(ranked)
}

#[async_trait]
impl LanguageDetector for LlmDetector {
    async fn rank(&self, text: &str) -> Result<Vec<Language>, ProviderError> {
        let reply = self.model.ask(DETECT_PROMPT, text, Some(8)).await?;
        rank_from_reply(&reply).ok_or_else(|| {
            ProviderError::Malformed(format!("no candidate language in reply: {:?}", reply))
        })
    }
}

/// Five-star sentiment scored by the model.
pub struct LlmSentiment {
    model: ModelRef,
}

impl LlmSentiment {
    pub fn new(backend: Arc<dyn LlmBackend>, model: impl Into<String>) -> Self {
        Self {
            model: ModelRef {
                backend,
                model: model.into(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct SentimentReply {
    label: serde_json::Value,
    #[serde(default)]
    score: Option<f32>,
}

/// Parse `{"label": "4 stars", "score": 0.8}` (also tolerates a bare number label and text around the object).
fn parse_sentiment_reply(reply: &str) -> Option<SentimentResult> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    let parsed: SentimentReply = serde_json::from_str(&reply[start..=end]).ok()?;
    let stars = match &parsed.label {
        serde_json::Value::Number(n) => n.as_u64()?,
        serde_json::Value::String(s) => s
            .trim()
            .split(|c: char| !c.is_ascii_digit())
            .find(|p| !p.is_empty())?
            .parse::<u64>()
            .ok()?,
        _ => return None,
    };
    if !(1..=5).contains(&stars) {
        return None;
    }
    let label = if stars == 1 {
        "1 star".to_string()
    } else {
        format!("{} stars", stars)
    };
    let score = parsed.score.unwrap_or(1.0);
    if !score.is_finite() {
        return None;
    }
    Some(SentimentResult {
        label,
        score: score.clamp(0.0, 1.0),
    })
}

#[async_trait]
impl SentimentScorer for LlmSentiment {
    async fn score(&self, text: &str) -> Result<SentimentResult, ProviderError> {
        let reply = self.model.ask(SENTIMENT_PROMPT, text, Some(40)).await?;
        parse_sentiment_reply(&reply).ok_or_else(|| {
            ProviderError::Malformed(format!("unreadable sentiment reply: {:?}", reply))
        })
    }
}

/// Translation by instruction prompt, one direction per call.
pub struct LlmTranslation {
    model: ModelRef,
}

impl LlmTranslation {
    pub fn new(backend: Arc<dyn LlmBackend>, model: impl Into<String>) -> Self {
        Self {
            model: ModelRef {
                backend,
                model: model.into(),
            },
        }
    }
}

fn translation_prompt(direction: Direction) -> String {
    format!(
        "Translate the user's message from {} to {}. Reply with the translation only, without quotes or notes.",
        direction.source(),
        direction.target()
    )
}

#[async_trait]
impl TranslationBackend for LlmTranslation {
    async fn translate(&self, text: &str, direction: Direction) -> Result<String, ProviderError> {
        let out = self
            .model
            .ask(&translation_prompt(direction), text, None)
            .await?;
        if out.is_empty() {
            return Err(ProviderError::Malformed("empty translation".to_string()));
        }
        Ok(out)
    }
}

/// Chat reply generation with a token budget and an optional character cap.
pub struct LlmGenerator {
    model: ModelRef,
    settings: GenerationConfig,
}

impl LlmGenerator {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        model: impl Into<String>,
        settings: GenerationConfig,
    ) -> Self {
        Self {
            model: ModelRef {
                backend,
                model: model.into(),
            },
            settings,
        }
    }
}

/// Apply prompt echo and the character cap to raw model output.
fn shape_generation(prompt: &str, continuation: &str, settings: &GenerationConfig) -> String {
    let mut out = if settings.echo_prompt && !continuation.is_empty() {
        format!("{} {}", prompt.trim_end(), continuation)
    } else if settings.echo_prompt {
        prompt.to_string()
    } else {
        continuation.to_string()
    };
    if let Some(max) = settings.max_chars {
        if let Some((idx, _)) = out.char_indices().nth(max) {
            out.truncate(idx);
        }
    }
    out
}

#[async_trait]
impl ResponseGenerator for LlmGenerator {
    async fn generate(&self, text: &str) -> Result<String, ProviderError> {
        let system = self
            .settings
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_CHAT_PROMPT);
        let continuation = self
            .model
            .ask(system, text, Some(self.settings.max_tokens))
            .await?;
        let out = shape_generation(text, &continuation, &self.settings);
        if out.trim().is_empty() {
            return Err(ProviderError::Malformed("empty generation".to_string()));
        }
        Ok(out)
    }
}
