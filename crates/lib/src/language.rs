//! Closed language set for detection and the directed pairs the translator supports.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A language the detector can return. Wire form is the lower-case English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    French,
    Spanish,
    Italian,
}

/// Detection candidates, in tie-break order.
pub const CANDIDATES: [Language; 4] = [
    Language::English,
    Language::French,
    Language::Spanish,
    Language::Italian,
];

/// Working language for response generation.
pub const CANONICAL: Language = Language::English;

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::English => "english",
            Language::French => "french",
            Language::Spanish => "spanish",
            Language::Italian => "italian",
        }
    }

    /// Exact parse of a lowercase wire name. Any other spelling is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        CANDIDATES.into_iter().find(|l| l.as_str() == s)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A supported directed translation pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// English into the given Romance language.
    FromEnglish(Language),
    /// The given Romance language into English.
    ToEnglish(Language),
}

impl Direction {
    /// Resolve a (source, target) request to a supported direction.
    /// Same-language pairs, Romance-to-Romance pairs and unknown names resolve to `None`.
    pub fn resolve(source: &str, target: &str) -> Option<Self> {
        let source = Language::parse(source)?;
        let target = Language::parse(target)?;
        match (source, target) {
            (Language::English, Language::English) => None,
            (Language::English, t) => Some(Direction::FromEnglish(t)),
            (s, Language::English) => Some(Direction::ToEnglish(s)),
            _ => None,
        }
    }

    pub fn source(self) -> Language {
        match self {
            Direction::FromEnglish(_) => Language::English,
            Direction::ToEnglish(l) => l,
        }
    }

    pub fn target(self) -> Language {
        match self {
            Direction::FromEnglish(l) => l,
            Direction::ToEnglish(_) => Language::English,
        }
    }
}
