use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::types::LabelScheme;
use crate::{Error, Result};

pub const DEFAULT_FEED_URL: &str = "https://news.google.com/rss/search?q=Enel&hl=it&gl=IT&ceid=IT:it";
pub const DEFAULT_COMPANY: &str = "Enel";
pub const DEFAULT_ALERT_THRESHOLD: f64 = -0.3;
pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_DATA_DIRECTORY: &str = "data";
pub const DEFAULT_SENTIMENT_MODEL: &str = "dbmdz/bert-base-italian-uncased-sentiment";
pub const DEFAULT_NER_MODEL: &str = "osiria/bert-italian-cased-ner";
pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";
pub const HISTORY_FILE_NAME: &str = "reputation_scores.csv";
pub const LOG_FILE_NAME: &str = "repscan.log";
pub const TRIGGERING_ARTICLE_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerKind {
    /// Remote model first, keyword lexicon if the model cannot be reached.
    Auto,
    Remote,
    Lexicon,
}

impl FromStr for ScorerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ScorerKind::Auto),
            "remote" | "model" => Ok(ScorerKind::Remote),
            "lexicon" | "keyword" | "keywords" => Ok(ScorerKind::Lexicon),
            other => Err(format!("Unknown scorer: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    Heuristic,
    Remote,
}

impl FromStr for DetectorKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "heuristic" | "local" => Ok(DetectorKind::Heuristic),
            "remote" | "model" => Ok(DetectorKind::Remote),
            other => Err(format!("Unknown detector: {}", other)),
        }
    }
}

#[derive(Clone)]
pub struct EmailSettings {
    pub sender: Option<String>,
    pub password: Option<String>,
    pub recipient: Option<String>,
    pub smtp_server: String,
    pub smtp_port: u16,
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSettings")
            .field("sender", &self.sender)
            .field("password", &self.password.as_deref().map(|_| "<redacted>"))
            .field("recipient", &self.recipient)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .finish()
    }
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            sender: None,
            password: None,
            recipient: None,
            smtp_server: DEFAULT_SMTP_SERVER.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
        }
    }
}

impl EmailSettings {
    /// Names of the credentials that still need a value before mail can go out.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.sender.as_deref().map_or(true, str::is_empty) {
            missing.push("EMAIL_SENDER");
        }
        if self.password.as_deref().map_or(true, str::is_empty) {
            missing.push("EMAIL_PASSWORD");
        }
        if self.recipient.as_deref().map_or(true, str::is_empty) {
            missing.push("EMAIL_RECIPIENT");
        }
        missing
    }
}

#[derive(Clone)]
pub struct Settings {
    pub feed_url: String,
    pub target_company: String,
    pub alert_threshold: f64,
    pub email: EmailSettings,
    pub data_dir: PathBuf,
    pub sentiment_model: String,
    pub ner_model: String,
    pub inference_url: String,
    pub inference_token: Option<String>,
    pub scorer: ScorerKind,
    pub detector: DetectorKind,
    pub label_scheme: LabelScheme,
    pub remove_stopwords: bool,
    pub max_concurrency: usize,
    pub request_timeout: Duration,
    pub triggering_article_limit: usize,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("feed_url", &self.feed_url)
            .field("target_company", &self.target_company)
            .field("alert_threshold", &self.alert_threshold)
            .field("email", &self.email)
            .field("data_dir", &self.data_dir)
            .field("sentiment_model", &self.sentiment_model)
            .field("ner_model", &self.ner_model)
            .field("inference_url", &self.inference_url)
            .field("inference_token", &self.inference_token.as_deref().map(|_| "<redacted>"))
            .field("scorer", &self.scorer)
            .field("detector", &self.detector)
            .field("label_scheme", &self.label_scheme)
            .field("remove_stopwords", &self.remove_stopwords)
            .field("max_concurrency", &self.max_concurrency)
            .field("request_timeout", &self.request_timeout)
            .field("triggering_article_limit", &self.triggering_article_limit)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            target_company: DEFAULT_COMPANY.to_string(),
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            email: EmailSettings::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIRECTORY),
            sentiment_model: DEFAULT_SENTIMENT_MODEL.to_string(),
            ner_model: DEFAULT_NER_MODEL.to_string(),
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            inference_token: None,
            scorer: ScorerKind::Auto,
            detector: DetectorKind::Heuristic,
            label_scheme: LabelScheme::default(),
            remove_stopwords: false,
            max_concurrency: 8,
            request_timeout: Duration::from_secs(10),
            triggering_article_limit: TRIGGERING_ARTICLE_LIMIT,
        }
    }
}

impl Settings {
    pub fn history_file(&self) -> PathBuf {
        self.data_dir.join(HISTORY_FILE_NAME)
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.feed_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", self.feed_url, e)))?;
        Url::parse(&self.inference_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", self.inference_url, e)))?;
        if self.target_company.trim().is_empty() {
            return Err(Error::Config("target company must not be empty".to_string()));
        }
        if !self.alert_threshold.is_finite() {
            return Err(Error::Config(format!(
                "alert threshold must be a finite number, got {}",
                self.alert_threshold
            )));
        }
        if self.max_concurrency == 0 {
            return Err(Error::Config("max concurrency must be at least 1".to_string()));
        }
        Ok(())
    }
}
