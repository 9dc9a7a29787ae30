//! Translator: supported directed pairs go to the backend, everything else is identity.
//!
//! Backend failures are absorbed here and also resolve to identity, so callers never
//! see a translation error.

use std::sync::Arc;

use crate::language::Direction;
use crate::providers::TranslationBackend;

#[derive(Clone)]
pub struct Translator {
    backend: Arc<dyn TranslationBackend>,
}

impl Translator {
    pub fn new(backend: Arc<dyn TranslationBackend>) -> Self {
        Self { backend }
    }

    /// Translate `text` from `source` to `target` (wire language names).
    /// Unsupported pairs, same-language pairs and backend errors all return `text` unchanged.
    pub async fn translate(&self, text: &str, source: &str, target: &str) -> String {
        let Some(direction) = Direction::resolve(source, target) else {
            log::debug!(
                "translate: {} -> {} not supported, passing text through",
                source,
                target
            );
            return text.to_string();
        };
        match self.backend.translate(text, direction).await {
            Ok(out) => out,
            Err(e) => {
                log::warn!(
                    "translate: {} -> {} failed, passing text through: {}",
                    direction.source(),
                    direction.target(),
                    e
                );
                text.to_string()
            }
        }
    }
}
