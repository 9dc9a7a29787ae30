//! In-process providers that need no model server: function-word language ranking
//! and a small multilingual sentiment lexicon on the five-star scale.

use async_trait::async_trait;

use super::{LanguageDetector, ProviderError, SentimentResult, SentimentScorer};
use crate::language::{Language, CANDIDATES};

const ENGLISH_WORDS: &[&str] = &[
    "the", "and", "is", "are", "you", "i", "to", "of", "it", "this", "that", "what", "how",
    "hello", "hi", "thanks", "with", "have", "my", "your", "was", "for", "not", "be", "do",
    "please", "good", "we", "am",
];

const FRENCH_WORDS: &[&str] = &[
    "le", "la", "les", "et", "est", "je", "tu", "vous", "nous", "un", "une", "des", "du", "de",
    "bonjour", "merci", "pas", "que", "qui", "c", "l", "j", "d", "ce", "avec", "pour", "suis",
    "très", "oui", "salut", "comment", "ça", "au", "bonsoir",
];

const SPANISH_WORDS: &[&str] = &[
    "el", "la", "los", "las", "y", "es", "yo", "tú", "usted", "un", "una", "hola", "gracias",
    "que", "por", "para", "con", "muy", "está", "estoy", "cómo", "qué", "no", "sí", "pero",
    "del", "al", "buenos", "días", "somos",
];

const ITALIAN_WORDS: &[&str] = &[
    "il", "lo", "gli", "e", "è", "io", "sono", "ciao", "grazie", "che", "per", "con", "non",
    "un", "una", "della", "del", "come", "sei", "molto", "buongiorno", "questo", "ho", "ma",
    "di", "anche", "buonasera",
];

fn function_words(lang: Language) -> &'static [&'static str] {
    match lang {
        Language::English => ENGLISH_WORDS,
        Language::French => FRENCH_WORDS,
        Language::Spanish => SPANISH_WORDS,
        Language::Italian => ITALIAN_WORDS,
    }
}

fn marker_letters(lang: Language) -> &'static [char] {
    match lang {
        Language::English => &[],
        Language::French => &['ç', 'œ', 'ê', 'â', 'î', 'û', 'ë'],
        Language::Spanish => &['ñ', '¿', '¡', 'á', 'í', 'ó'],
        Language::Italian => &['ò', 'ì', 'ù'],
    }
}

pub(super) fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ranks the closed candidate set by function-word hits plus language-specific letters.
/// Ties keep candidate order, so text with no evidence ranks English first.
#[derive(Debug, Default, Clone, Copy)]
pub struct StopwordDetector;

impl StopwordDetector {
    pub fn new() -> Self {
        Self
    }

    /// Evidence per candidate, in candidate order.
    pub fn scores(&self, text: &str) -> [(Language, usize); 4] {
        let words = tokens(text);
        let lower = text.to_lowercase();
        CANDIDATES.map(|lang| {
            let vocab = function_words(lang);
            let word_hits = words.iter().filter(|w| vocab.contains(&w.as_str())).count();
            let letter_hits = lower
                .chars()
                .filter(|c| marker_letters(lang).contains(c))
                .count();
            (lang, word_hits + letter_hits)
        })
    }
}

#[async_trait]
impl LanguageDetector for StopwordDetector {
    async fn rank(&self, text: &str) -> Result<Vec<Language>, ProviderError> {
        let mut scored = self.scores(text).to_vec();
        // stable: equal scores keep candidate order
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(scored.into_iter().map(|(l, _)| l).collect())
    }
}

const POSITIVE: &[&str] = &[
    "good", "great", "excellent", "love", "like", "happy", "wonderful", "amazing", "thanks",
    "thank", "nice", "awesome", "perfect", "best", "fantastic", "glad", "beautiful", "bon",
    "bonne", "bien", "génial", "merci", "heureux", "heureuse", "content", "contente", "aime",
    "adore", "super", "parfait", "magnifique", "bueno", "buena", "genial", "gracias", "feliz",
    "encanta", "excelente", "perfecto", "maravilloso", "mejor", "buono", "buona", "bene",
    "grazie", "felice", "ottimo", "perfetto", "bellissimo", "amo", "fantastico", "meraviglioso",
    "contento",
];

const NEGATIVE: &[&str] = &[
    "bad", "terrible", "awful", "hate", "sad", "angry", "horrible", "worst", "poor", "boring",
    "broken", "disappointed", "useless", "annoying", "wrong", "mauvais", "mauvaise", "triste",
    "déteste", "nul", "nulle", "pire", "fâché", "déçu", "malo", "mala", "odio", "peor",
    "enojado", "aburrido", "decepcionado", "cattivo", "cattiva", "terribile", "orribile",
    "peggiore", "arrabbiato", "deluso", "brutto",
];

pub(super) const NEGATORS: &[&str] = &["not", "no", "never", "pas", "jamais", "non", "nunca", "mai"];

/// Lexicon polarity mapped onto the labels `1 star` .. `5 stars`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconSentiment;

impl LexiconSentiment {
    pub fn new() -> Self {
        Self
    }

    /// (positive hits, negative hits); a negator directly before a word flips it.
    fn hits(&self, text: &str) -> (usize, usize) {
        let words = tokens(text);
        let mut pos = 0;
        let mut neg = 0;
        for (i, w) in words.iter().enumerate() {
            let w = w.as_str();
            let polarity = if POSITIVE.contains(&w) {
                1
            } else if NEGATIVE.contains(&w) {
                -1
            } else {
                continue;
            };
            let negated = i > 0 && NEGATORS.contains(&words[i - 1].as_str());
            if (polarity > 0) != negated {
                pos += 1;
            } else {
                neg += 1;
            }
        }
        (pos, neg)
    }

    pub fn classify(&self, text: &str) -> SentimentResult {
        let (pos, neg) = self.hits(text);
        let total = pos + neg;
        let polarity = if total == 0 {
            0.0
        } else {
            (pos as f32 - neg as f32) / total as f32
        };
        let stars = (3.0 + 2.0 * polarity).round().clamp(1.0, 5.0) as u8;
        let label = if stars == 1 {
            "1 star".to_string()
        } else {
            format!("{} stars", stars)
        };
        let score = (pos.max(neg) as f32 + 1.0) / (total as f32 + 2.0);
        SentimentResult { label, score }
    }
}

#[async_trait]
impl SentimentScorer for LexiconSentiment {
    async fn score(&self, text: &str) -> Result<SentimentResult, ProviderError> {
        Ok(self.classify(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn detects_each_candidate() {
        let d = StopwordDetector::new();
        assert_eq!(d.detect("Hello, how are you?").await.unwrap(), Language::English);
        assert_eq!(d.detect("Bonjour").await.unwrap(), Language::French);
        assert_eq!(
            d.detect("Hola, ¿cómo estás? Muy bien, gracias").await.unwrap(),
            Language::Spanish
        );
        assert_eq!(
            d.detect("Ciao, come stai? Sono molto contento").await.unwrap(),
            Language::Italian
        );
    }

    #[tokio::test]
    async fn no_evidence_ranks_candidates_in_order() {
        let d = StopwordDetector::new();
        let ranked = d.rank("12345 ???").await.unwrap();
        assert_eq!(ranked, CANDIDATES.to_vec());
    }

    #[test]
    fn elided_articles_count_for_french() {
        let d = StopwordDetector::new();
        let scores = d.scores("c'est l'été");
        let french = scores.iter().find(|(l, _)| *l == Language::French).unwrap().1;
        assert!(french >= 2);
    }

    #[test]
    fn positive_text_gets_five_stars() {
        let r = LexiconSentiment::new().classify("I love this, it is great");
        assert_eq!(r.label, "5 stars");
        assert!(r.score > 0.5 && r.score <= 1.0);
    }

    #[test]
    fn negative_text_gets_one_star() {
        let r = LexiconSentiment::new().classify("C'est nul, je déteste ça");
        assert_eq!(r.label, "1 star");
    }

    #[test]
    fn neutral_text_is_three_stars_half_confidence() {
        let r = LexiconSentiment::new().classify("Bonjour");
        assert_eq!(r.label, "3 stars");
        assert_eq!(r.score, 0.5);
    }

    #[test]
    fn negator_flips_polarity() {
        let r = LexiconSentiment::new().classify("not good");
        assert_eq!(r.label, "1 star");
    }

    #[test]
    fn mixed_text_lands_in_between() {
        let r = LexiconSentiment::new().classify("good food, bad service, great view");
        assert_eq!(r.label, "4 stars");
    }
}
