use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

use rep_core::{DetectorKind, Error, Mention, MentionDetector, Result, Settings, LITERAL_MATCH};

pub mod remote;

pub use remote::RemoteMentionDetector;

/// Characters of context kept on each side of a mention.
pub const CONTEXT_RADIUS: usize = 50;

const ORG_SUFFIXES: &[&str] = &[
    "spa", "s.p.a.", "srl", "s.r.l.", "inc", "inc.", "ltd", "ltd.", "corp", "corp.", "plc", "llc",
    "ag", "se", "nv", "sa", "group", "gruppo", "holding", "bank", "banca", "energia", "energy",
    "power", "company", "foundation", "fondazione",
];

/// Up to `radius` characters either side of the byte range `start..end`.
pub fn context_window(text: &str, start: usize, end: usize, radius: usize) -> String {
    let ctx_start = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(start, |(i, _)| i);
    let ctx_end = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);
    text[ctx_start..ctx_end].to_string()
}

/// Case-insensitive occurrences of `company` in `text`, as literal-match mentions.
pub fn literal_mentions(text: &str, company: &str) -> Vec<Mention> {
    if company.trim().is_empty() {
        return Vec::new();
    }
    let Ok(pattern) = RegexBuilder::new(&regex::escape(company.trim()))
        .case_insensitive(true)
        .build()
    else {
        return Vec::new();
    };
    pattern
        .find_iter(text)
        .map(|m| Mention {
            text: m.as_str().to_string(),
            context: context_window(text, m.start(), m.end(), CONTEXT_RADIUS),
            entity_type: LITERAL_MATCH.to_string(),
        })
        .collect()
}

/// Offline detector: runs of capitalised words, typed `ORG` when they carry a
/// corporate suffix, are an acronym, or name the company being tracked.
pub struct HeuristicMentionDetector {
    span_regex: Regex,
}

impl Default for HeuristicMentionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicMentionDetector {
    pub fn new() -> Self {
        Self {
            span_regex: Regex::new(r"\p{Lu}[\p{L}\p{N}\.]*(?:\s+\p{Lu}[\p{L}\p{N}\.]*)*")
                .expect("valid span regex"),
        }
    }

    fn classify(&self, span: &str, company: &str) -> &'static str {
        let lower = span.to_lowercase();
        if !company.is_empty() && lower.contains(&company.to_lowercase()) {
            return "ORG";
        }
        let tokens: Vec<&str> = span.split_whitespace().collect();
        let has_suffix = tokens.len() > 1
            && tokens
                .last()
                .map_or(false, |t| ORG_SUFFIXES.contains(&t.to_lowercase().as_str()));
        let acronym = tokens.len() == 1
            && span.chars().filter(|c| c.is_alphabetic()).count() >= 2
            && span.chars().all(|c| !c.is_alphabetic() || c.is_uppercase());
        if has_suffix || acronym {
            "ORG"
        } else {
            "MISC"
        }
    }

    pub fn extract_entities(&self, text: &str, company: &str) -> Vec<Mention> {
        self.span_regex
            .find_iter(text)
            .map(|m| {
                let span = m.as_str().trim_end_matches('.');
                Mention {
                    text: span.to_string(),
                    context: context_window(text, m.start(), m.start() + span.len(), CONTEXT_RADIUS),
                    entity_type: self.classify(span, company).to_string(),
                }
            })
            .collect()
    }
}

#[async_trait]
impl MentionDetector for HeuristicMentionDetector {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn detect_mentions(&self, text: &str, company: &str) -> Result<Vec<Mention>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let mentions: Vec<Mention> = self
            .extract_entities(text, company)
            .into_iter()
            .filter(|m| m.is_organization_like() && m.names(company))
            .collect();
        tracing::debug!("Found {} mentions of {} in text", mentions.len(), company);
        Ok(mentions)
    }
}

pub fn create_detector(settings: &Settings) -> Result<Arc<dyn MentionDetector>> {
    match settings.detector {
        DetectorKind::Heuristic => Ok(Arc::new(HeuristicMentionDetector::new())),
        DetectorKind::Remote => {
            let detector = RemoteMentionDetector::from_settings(settings)
                .map_err(|e| Error::Config(format!("Unable to create mention detector: {}", e)))?;
            Ok(Arc::new(detector))
        }
    }
}
