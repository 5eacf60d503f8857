use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format of every timestamp written to the history and report files.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Entity types the relevance filter accepts from a mention detector.
pub const ORGANIZATION_LIKE: &[&str] = &["ORG", "ORGANIZATION", "PRODUCT", "COMPANY"];

/// Entity type attached to mentions found by plain substring matching.
pub const LITERAL_MATCH: &str = "MATCH";

/// An item as handed over by a feed fetcher, before any text processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawArticle {
    pub title: String,
    pub link: String,
    /// Publication date exactly as the feed spelled it.
    pub published: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub published: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub raw_content: String,
    pub normalized_title: String,
    pub normalized_content: String,
}

impl Article {
    /// Normalized title and content joined the way the relevance filter reads them.
    pub fn full_text(&self) -> String {
        match (self.normalized_title.is_empty(), self.normalized_content.is_empty()) {
            (true, _) => self.normalized_content.clone(),
            (false, true) => self.normalized_title.clone(),
            (false, false) => format!("{} {}", self.normalized_title, self.normalized_content),
        }
    }

    /// Aggregation weight: character count of the normalized content.
    pub fn content_length(&self) -> usize {
        self.normalized_content.chars().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchTier {
    /// The company name appears verbatim (case-insensitive) in the text.
    Literal,
    /// The mention detector reported an organization entity naming the company.
    Detector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub text: String,
    pub context: String,
    pub entity_type: String,
}

impl Mention {
    pub fn is_organization_like(&self) -> bool {
        ORGANIZATION_LIKE
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&self.entity_type))
    }

    pub fn names(&self, company: &str) -> bool {
        self.text.to_lowercase().contains(&company.to_lowercase())
    }
}

/// An article that passed the relevance gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevantArticle {
    pub article: Article,
    pub matched_by: MatchTier,
    pub mentions: Vec<Mention>,
}

/// A relevant article with its sentiment attached. Never modified once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredArticle {
    pub relevant: RelevantArticle,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
}

impl ScoredArticle {
    pub fn new(relevant: RelevantArticle, sentiment_score: f64, sentiment_label: SentimentLabel) -> Self {
        Self {
            relevant,
            sentiment_score,
            sentiment_label,
        }
    }

    pub fn article(&self) -> &Article {
        &self.relevant.article
    }

    pub fn title(&self) -> &str {
        &self.relevant.article.title
    }

    pub fn link(&self) -> &str {
        &self.relevant.article.link
    }

    pub fn content_length(&self) -> usize {
        self.relevant.article.content_length()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    VeryNegative,
    Negative,
    Neutral,
    Positive,
    VeryPositive,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SentimentLabel::VeryNegative => "Very Negative",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Positive => "Positive",
            SentimentLabel::VeryPositive => "Very Positive",
        };
        f.write_str(s)
    }
}

/// How a sentiment score is turned into a label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LabelScheme {
    /// Positive / Neutral / Negative split at `±neutral_band`.
    ThreeWay { neutral_band: f64 },
    /// Adds the two "very" buckets beyond `±strong_band`.
    FiveWay { neutral_band: f64, strong_band: f64 },
}

impl Default for LabelScheme {
    fn default() -> Self {
        LabelScheme::ThreeWay { neutral_band: 0.2 }
    }
}

impl LabelScheme {
    pub fn five_way() -> Self {
        LabelScheme::FiveWay {
            neutral_band: 0.2,
            strong_band: 0.6,
        }
    }

    pub fn label(&self, score: f64) -> SentimentLabel {
        match *self {
            LabelScheme::ThreeWay { neutral_band } => {
                if score > neutral_band {
                    SentimentLabel::Positive
                } else if score < -neutral_band {
                    SentimentLabel::Negative
                } else {
                    SentimentLabel::Neutral
                }
            }
            LabelScheme::FiveWay { neutral_band, strong_band } => {
                if score >= strong_band {
                    SentimentLabel::VeryPositive
                } else if score > neutral_band {
                    SentimentLabel::Positive
                } else if score <= -strong_band {
                    SentimentLabel::VeryNegative
                } else if score < -neutral_band {
                    SentimentLabel::Negative
                } else {
                    SentimentLabel::Neutral
                }
            }
        }
    }
}

impl std::str::FromStr for LabelScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "three" | "3" | "three-way" => Ok(LabelScheme::default()),
            "five" | "5" | "five-way" => Ok(LabelScheme::five_way()),
            other => Err(format!("Unknown label scheme: {}", other)),
        }
    }
}

/// The aggregate result of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReputationScore {
    pub value: f64,
    pub computed_at: DateTime<Utc>,
    pub contributing_article_count: usize,
}

impl ReputationScore {
    pub fn empty(computed_at: DateTime<Utc>) -> Self {
        Self {
            value: 0.0,
            computed_at,
            contributing_article_count: 0,
        }
    }

    pub fn timestamp(&self) -> String {
        self.computed_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// One persisted row of the score history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: String,
    pub score: f64,
}

impl HistoryRecord {
    pub fn new(timestamp: impl Into<String>, score: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            score,
        }
    }

    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }
}

#[derive(Debug, Clone)]
pub struct AlertDecision {
    pub should_alert: bool,
    pub score: f64,
    pub threshold: f64,
    /// Most negative articles first.
    pub triggering_articles: Vec<ScoredArticle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, content: &str) -> Article {
        Article {
            title: title.to_string(),
            link: "http://test.com".to_string(),
            published: None,
            published_at: None,
            raw_content: content.to_string(),
            normalized_title: title.to_string(),
            normalized_content: content.to_string(),
        }
    }

    #[test]
    fn test_three_way_labels() {
        let scheme = LabelScheme::default();
        assert_eq!(scheme.label(0.5), SentimentLabel::Positive);
        assert_eq!(scheme.label(0.2), SentimentLabel::Neutral);
        assert_eq!(scheme.label(-0.2), SentimentLabel::Neutral);
        assert_eq!(scheme.label(-0.21), SentimentLabel::Negative);
        assert_eq!(scheme.label(-1.0), SentimentLabel::Negative);
    }

    #[test]
    fn test_five_way_labels() {
        let scheme = LabelScheme::five_way();
        assert_eq!(scheme.label(0.9), SentimentLabel::VeryPositive);
        assert_eq!(scheme.label(0.4), SentimentLabel::Positive);
        assert_eq!(scheme.label(0.0), SentimentLabel::Neutral);
        assert_eq!(scheme.label(-0.4), SentimentLabel::Negative);
        assert_eq!(scheme.label(-0.6), SentimentLabel::VeryNegative);
    }

    #[test]
    fn test_label_scheme_from_str() {
        assert_eq!("five".parse::<LabelScheme>().unwrap(), LabelScheme::five_way());
        assert_eq!("3".parse::<LabelScheme>().unwrap(), LabelScheme::default());
        assert!("seven".parse::<LabelScheme>().is_err());
    }

    #[test]
    fn test_content_length_counts_chars() {
        let a = article("Titolo", "città");
        assert_eq!(a.content_length(), 5);
        assert_eq!(a.full_text(), "Titolo città");
        assert_eq!(article("", "body").full_text(), "body");
        assert_eq!(article("head", "").full_text(), "head");
    }

    #[test]
    fn test_mention_organization_like() {
        let mention = Mention {
            text: "Enel Green Power".to_string(),
            context: String::new(),
            entity_type: "org".to_string(),
        };
        assert!(mention.is_organization_like());
        assert!(mention.names("ENEL"));

        let person = Mention {
            entity_type: "PER".to_string(),
            ..mention
        };
        assert!(!person.is_organization_like());
    }

    #[test]
    fn test_history_record_timestamp() {
        let record = HistoryRecord::new("2024-03-01 10:15:00", -0.25);
        assert!(record.parsed_timestamp().is_some());
        assert!(HistoryRecord::new("yesterday", 0.0).parsed_timestamp().is_none());
    }
}
