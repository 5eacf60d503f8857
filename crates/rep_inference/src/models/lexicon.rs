use async_trait::async_trait;
use std::fmt;

use rep_core::{LabelScheme, Result, SentimentScorer};

/// Stems and their polarity. A token matches when it starts with the stem.
const POSITIVE_STEMS: &[(&str, f64)] = &[
    ("ottim", 0.8), ("eccellent", 0.9), ("positiv", 0.6), ("buon", 0.5), ("success", 0.7),
    ("crescit", 0.5), ("utile", 0.4), ("record", 0.6), ("miglior", 0.6), ("rialz", 0.6),
    ("accord", 0.3), ("premiat", 0.5), ("innovaz", 0.4), ("solid", 0.4), ("forte", 0.4),
    ("excellent", 0.9), ("great", 0.7), ("good", 0.5), ("positive", 0.6), ("growth", 0.6),
    ("profit", 0.6), ("gain", 0.5), ("strong", 0.5), ("improv", 0.5), ("success", 0.7),
    ("upgrade", 0.6), ("award", 0.5), ("rebound", 0.5),
];

const NEGATIVE_STEMS: &[(&str, f64)] = &[
    ("pessim", -0.8), ("negativ", -0.6), ("cattiv", -0.6), ("fallim", -0.9), ("problem", -0.5),
    ("crisi", -0.8), ("perdit", -0.6), ("crollo", -0.9), ("ribass", -0.6),
    ("scandal", -0.9), ("multa", -0.7), ("sanzion", -0.7), ("indagin", -0.6), ("guast", -0.5),
    ("blackout", -0.7), ("protest", -0.5), ("sciopero", -0.5), ("debit", -0.4), ("frode", -0.9),
    ("negative", -0.6), ("loss", -0.6), ("decline", -0.6), ("crash", -0.9),
    ("fraud", -0.9), ("scandal", -0.9), ("lawsuit", -0.7), ("outage", -0.7),
    ("downgrade", -0.6), ("warning", -0.5), ("fail", -0.7), ("crisis", -0.8),
];

/// Short words that only count as a whole token.
const EXACT_WORDS: &[(&str, f64)] = &[
    ("premio", 0.5), ("premi", 0.5), ("calo", -0.5), ("cali", -0.5), ("bad", -0.6),
    ("worse", -0.6), ("worst", -0.7), ("fine", -0.4), ("fined", -0.5), ("fines", -0.4),
];

const NEGATIONS: &[&str] = &[
    "non", "mai", "nessun", "nessuna", "nessuno", "senza", "né", "not", "no", "never", "without",
    "nor", "hardly",
];

/// Tokens after a negation whose polarity gets flipped.
const NEGATION_WINDOW: usize = 3;

/// Keyword scorer used when no model is reachable.
pub struct LexiconScorer {
    scheme: LabelScheme,
}

impl fmt::Debug for LexiconScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LexiconScorer").field("scheme", &self.scheme).finish()
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new(LabelScheme::default())
    }
}

impl LexiconScorer {
    pub fn new(scheme: LabelScheme) -> Self {
        Self { scheme }
    }

    fn polarity(token: &str) -> Option<f64> {
        if let Some(&(_, weight)) = EXACT_WORDS.iter().find(|(word, _)| *word == token) {
            return Some(weight);
        }
        POSITIVE_STEMS
            .iter()
            .chain(NEGATIVE_STEMS.iter())
            .filter(|(stem, _)| token.starts_with(stem))
            .max_by_key(|(stem, _)| stem.len())
            .map(|&(_, weight)| weight)
    }

    /// `Σw / Σ|w|` over matched tokens, so the result stays within [-1, 1].
    pub fn analyze(&self, text: &str) -> f64 {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut sum = 0.0;
        let mut magnitude = 0.0;
        let mut negated_for = 0usize;

        for token in tokens {
            if NEGATIONS.contains(&token) {
                negated_for = NEGATION_WINDOW;
                continue;
            }
            if let Some(weight) = Self::polarity(token) {
                let weight = if negated_for > 0 { -weight } else { weight };
                sum += weight;
                magnitude += f64::abs(weight);
            }
            negated_for = negated_for.saturating_sub(1);
        }

        if magnitude == 0.0 {
            0.0
        } else {
            (sum / magnitude).clamp(-1.0, 1.0)
        }
    }
}

#[async_trait]
impl SentimentScorer for LexiconScorer {
    fn name(&self) -> &str {
        "lexicon"
    }

    async fn score(&self, text: &str) -> Result<f64> {
        tracing::debug!("Using keyword-based sentiment analysis");
        Ok(self.analyze(text))
    }

    fn label_scheme(&self) -> LabelScheme {
        self.scheme
    }
}
