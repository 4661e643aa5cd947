//! Identity intent matcher.
//!
//! Detects messages asking who the assistant is or who built it, using
//! substring containment first and bigram similarity as a fuzzy fallback.

use std::collections::HashMap;

use webs_core::{config::IdentityConfig, traits::IntentMatcher, types::IntentMatch};

/// Normalize text for matching and cache keys: lower-cased and trimmed.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Sørensen–Dice coefficient over character bigrams.
///
/// Whitespace is ignored. Identical strings score 1.0; strings shorter than
/// two characters score 0.0 unless identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().filter(|c| !c.is_whitespace()).collect();
    let b: Vec<char> = b.chars().filter(|c| !c.is_whitespace()).collect();

    if a == b {
        return 1.0;
    }
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut bigrams: HashMap<(char, char), usize> = HashMap::new();
    for pair in a.windows(2) {
        *bigrams.entry((pair[0], pair[1])).or_insert(0) += 1;
    }

    let mut intersection = 0usize;
    for pair in b.windows(2) {
        if let Some(count) = bigrams.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                intersection += 1;
            }
        }
    }

    (2 * intersection) as f64 / (a.len() + b.len() - 2) as f64
}

/// Matcher over a fixed set of identity phrases.
pub struct PhraseIntentMatcher {
    /// Lower-cased reference phrases, in match priority order.
    phrases: Vec<String>,
    threshold: f64,
    reply: String,
}

impl PhraseIntentMatcher {
    /// Create a matcher. Phrases are normalized; blank phrases are dropped.
    pub fn new(phrases: &[String], threshold: f64, reply: impl Into<String>) -> Self {
        Self {
            phrases: phrases
                .iter()
                .map(|p| normalize(p))
                .filter(|p| !p.is_empty())
                .collect(),
            threshold: threshold.clamp(0.0, 1.0),
            reply: reply.into(),
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(&config.phrases, config.threshold, config.reply.clone())
    }

    /// Number of reference phrases.
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

impl Default for PhraseIntentMatcher {
    fn default() -> Self {
        Self::from_config(&IdentityConfig::default())
    }
}

impl IntentMatcher for PhraseIntentMatcher {
    fn classify(&self, message: &str) -> IntentMatch {
        let normalized = normalize(message);
        if normalized.is_empty() {
            return IntentMatch::none();
        }

        for phrase in &self.phrases {
            if normalized.contains(phrase.as_str()) {
                tracing::debug!(phrase = %phrase, "Identity intent matched by containment");
                return IntentMatch::matched(self.reply.clone());
            }

            let score = similarity(&normalized, phrase);
            if score >= self.threshold {
                tracing::debug!(phrase = %phrase, score, "Identity intent matched by similarity");
                return IntentMatch::matched(self.reply.clone());
            }
        }

        IntentMatch::none()
    }
}
