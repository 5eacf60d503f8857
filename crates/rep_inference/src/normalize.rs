use regex::Regex;
use scraper::Html;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

use rep_core::{Error, Result, TextNormalizer};

const STOP_WORDS: &[&str] = &[
    // Italian
    "il", "lo", "la", "i", "gli", "le", "un", "uno", "una", "di", "a", "da", "in", "con", "su",
    "per", "tra", "fra", "del", "dello", "della", "dei", "degli", "delle", "al", "allo", "alla",
    "ai", "agli", "alle", "dal", "dallo", "dalla", "dai", "dagli", "dalle", "nel", "nello",
    "nella", "nei", "negli", "nelle", "sul", "sullo", "sulla", "sui", "sugli", "sulle", "e",
    "ed", "o", "ma", "che", "chi", "cui", "come", "anche", "più", "è", "sono", "era", "essere",
    "ha", "hanno", "questo", "questa", "quello", "quella", "si", "ci", "ne", "non",
    // English
    "the", "an", "of", "to", "and", "or", "but", "is", "are", "was", "were", "be", "been",
    "has", "have", "had", "it", "its", "this", "that", "these", "those", "for", "on", "at",
    "by", "with", "from", "as", "into", "not",
];

/// Cleans feed and page text before mention detection and scoring.
pub struct TextPreprocessor {
    url_regex: Regex,
    special_regex: Regex,
    whitespace_regex: Regex,
    stop_words: HashSet<&'static str>,
    remove_stops: bool,
}

impl Default for TextPreprocessor {
    fn default() -> Self {
        Self::new(false)
    }
}

impl TextPreprocessor {
    pub fn new(remove_stops: bool) -> Self {
        Self {
            url_regex: Regex::new(r"https?://\S+|www\.\S+").expect("valid url regex"),
            special_regex: Regex::new(r"[^\w\s\.,;:!?]").expect("valid special char regex"),
            whitespace_regex: Regex::new(r"\s+").expect("valid whitespace regex"),
            stop_words: STOP_WORDS.iter().copied().collect(),
            remove_stops,
        }
    }

    pub fn remove_html_tags(&self, text: &str) -> String {
        if !text.contains('<') && !text.contains('&') {
            return text.to_string();
        }
        let fragment = Html::parse_fragment(text);
        fragment.root_element().text().collect::<Vec<_>>().join(" ")
    }

    pub fn remove_urls(&self, text: &str) -> String {
        self.url_regex.replace_all(text, "").into_owned()
    }

    pub fn remove_special_chars(&self, text: &str) -> String {
        let composed: String = text.nfkc().collect();
        let cleaned = self.special_regex.replace_all(&composed, "");
        self.whitespace_regex
            .replace_all(&cleaned, " ")
            .trim()
            .to_string()
    }

    pub fn remove_stopwords(&self, text: &str) -> String {
        text.split_whitespace()
            .filter(|word| {
                let bare = word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
                !self.stop_words.contains(bare.as_str())
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn preprocess(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }
        let text = self.remove_html_tags(text);
        let text = self.remove_urls(&text);
        let text = self.remove_special_chars(&text);
        if self.remove_stops {
            self.remove_stopwords(&text)
        } else {
            text
        }
    }
}

impl TextNormalizer for TextPreprocessor {
    fn normalize(&self, text: &str) -> Result<String> {
        if text.contains('\0') {
            return Err(Error::Normalization("text contains NUL bytes".to_string()));
        }
        Ok(self.preprocess(text))
    }
}
