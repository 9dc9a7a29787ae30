//! Build the pipeline context from config: one provider per capability, created once at startup.
//!
//! Any provider that cannot be brought up is a startup error; the gateway never serves with a
//! partially initialized context.

use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use std::sync::Arc;

use crate::config::{self, Config, ProviderBackend, ProviderConfig};
use crate::llm::{LlmBackend, LmStudioClient, OllamaClient};
use crate::pipeline::PipelineContext;
use crate::providers::{
    LanguageDetector, LexiconSentiment, LlmDetector, LlmGenerator, LlmSentiment, LlmTranslation,
    ResponseGenerator, SentimentScorer, StopwordDetector, TranslationBackend,
};
use crate::translate::Translator;

/// Which backend (and model) serves each capability; reported by the health endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub detector: String,
    pub sentiment: String,
    pub translator: String,
    pub generator: String,
}

fn describe(p: &ProviderConfig) -> String {
    match (p.backend, p.model.as_deref()) {
        (ProviderBackend::Builtin, _) | (_, None) => p.backend.as_str().to_string(),
        (b, Some(m)) => format!("{}:{}", b.as_str(), m),
    }
}

impl ProviderSummary {
    pub fn from_config(config: &Config) -> Self {
        let p = &config.pipeline;
        Self {
            detector: describe(&p.detector),
            sentiment: describe(&p.sentiment),
            translator: describe(&p.translator),
            generator: describe(&p.generator),
        }
    }
}

/// Lazily created backend clients; each is contacted once to verify configured models.
struct Backends<'a> {
    config: &'a Config,
    ollama: Option<Arc<dyn LlmBackend>>,
    lm_studio: Option<Arc<dyn LlmBackend>>,
}

impl<'a> Backends<'a> {
    fn new(config: &'a Config) -> Self {
        Self {
            config,
            ollama: None,
            lm_studio: None,
        }
    }

    fn client(&mut self, backend: ProviderBackend) -> Result<Arc<dyn LlmBackend>> {
        match backend {
            ProviderBackend::Builtin => bail!("builtin has no LLM client"),
            ProviderBackend::Ollama => {
                if self.ollama.is_none() {
                    let url = config::resolve_ollama_base_url(self.config);
                    log::info!("using ollama at {}", url);
                    let client =
                        OllamaClient::new(Some(url), self.config.backends.ollama.timeout())
                            .context("creating ollama client")?;
                    self.ollama = Some(Arc::new(client));
                }
                self.ollama.clone().context("ollama client")
            }
            ProviderBackend::Lmstudio => {
                if self.lm_studio.is_none() {
                    let url = config::resolve_lm_studio_base_url(self.config);
                    log::info!("using lm studio at {}", url);
                    let client =
                        LmStudioClient::new(Some(url), self.config.backends.lm_studio.timeout())
                            .context("creating lm studio client")?;
                    self.lm_studio = Some(Arc::new(client));
                }
                self.lm_studio.clone().context("lm studio client")
            }
        }
    }

    /// Client plus a model verified to be available on it.
    async fn model(
        &mut self,
        capability: &str,
        p: &ProviderConfig,
    ) -> Result<(Arc<dyn LlmBackend>, String)> {
        let model = p
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .with_context(|| format!("{}: backend {} needs a model", capability, p.backend.as_str()))?
            .to_string();
        let client = self.client(p.backend)?;
        let available = client.list_models().await.with_context(|| {
            format!("{}: listing models on {}", capability, client.name())
        })?;
        if !client.has_model(&available, &model) {
            bail!(
                "{}: model {} is not available on {} (found: {})",
                capability,
                model,
                client.name(),
                available.join(", ")
            );
        }
        log::info!("{}: {} model {}", capability, client.name(), model);
        Ok((client, model))
    }
}

/// Construct every provider named in config. Fails on the first provider that cannot be loaded.
pub async fn build_context(config: &Config) -> Result<PipelineContext> {
    let mut backends = Backends::new(config);
    let p = &config.pipeline;
    if p.generation.max_chars == Some(0) {
        bail!("generator: generation.maxChars must be at least 1");
    }

    let detector: Arc<dyn LanguageDetector> = match p.detector.backend {
        ProviderBackend::Builtin => Arc::new(StopwordDetector::new()),
        _ => {
            let (client, model) = backends.model("detector", &p.detector).await?;
            Arc::new(LlmDetector::new(client, model))
        }
    };

    let sentiment: Arc<dyn SentimentScorer> = match p.sentiment.backend {
        ProviderBackend::Builtin => Arc::new(LexiconSentiment::new()),
        _ => {
            let (client, model) = backends.model("sentiment", &p.sentiment).await?;
            Arc::new(LlmSentiment::new(client, model))
        }
    };

    let translation: Arc<dyn TranslationBackend> = match p.translator.backend {
        ProviderBackend::Builtin => {
            bail!("translator: no builtin translation backend; use \"ollama\" or \"lmstudio\"")
        }
        _ => {
            let (client, model) = backends.model("translator", &p.translator).await?;
            Arc::new(LlmTranslation::new(client, model))
        }
    };

    let generator: Arc<dyn ResponseGenerator> = match p.generator.backend {
        ProviderBackend::Builtin => {
            bail!("generator: no builtin generation backend; use \"ollama\" or \"lmstudio\"")
        }
        _ => {
            let (client, model) = backends.model("generator", &p.generator).await?;
            Arc::new(LlmGenerator::new(client, model, p.generation.clone()))
        }
    };

    Ok(PipelineContext {
        detector,
        sentiment,
        translator: Translator::new(translation),
        generator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builtin_translator_is_rejected() {
        let mut config = Config::default();
        config.pipeline.translator.backend = ProviderBackend::Builtin;
        let err = build_context(&config).await.err().expect("must fail");
        assert!(err.to_string().contains("translator"));
    }

    #[tokio::test]
    async fn llm_backend_without_model_is_rejected() {
        let mut config = Config::default();
        config.pipeline.detector = ProviderConfig {
            backend: ProviderBackend::Ollama,
            model: None,
        };
        let err = build_context(&config).await.err().expect("must fail");
        assert!(err.to_string().contains("needs a model"));
    }

    #[tokio::test]
    async fn zero_char_cap_is_rejected_before_contacting_backends() {
        let mut config = Config::default();
        config.backends.ollama.base_url = Some("http://127.0.0.1:9".to_string());
        config.pipeline.generation.max_chars = Some(0);
        let err = build_context(&config).await.err().expect("must fail");
        assert!(err.to_string().contains("maxChars"), "{:#}", err);
    }

    #[test]
    fn summary_describes_backends() {
        let s = ProviderSummary::from_config(&Config::default());
        assert_eq!(s.detector, "builtin");
        assert_eq!(s.generator, "ollama:llama3.2:latest");
    }
}
