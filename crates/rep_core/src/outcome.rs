use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a run ended before scoring anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    NoArticles,
    NoRelevantArticles,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::NoArticles => f.write_str("no articles found"),
            StopReason::NoRelevantArticles => f.write_str("no relevant articles found"),
        }
    }
}

/// A stage that did not do its full job but did not stop the run either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Degradation {
    FeedUnavailable(String),
    ArticleDropped { link: String, reason: String },
    NeutralSentiment { link: String, reason: String },
    HistoryNotPersisted(String),
    ReportNotSaved(String),
    AlertNotDelivered(AlertOutcome),
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::FeedUnavailable(reason) => write!(f, "feed unavailable: {}", reason),
            Degradation::ArticleDropped { link, reason } => {
                write!(f, "article {} dropped: {}", link, reason)
            }
            Degradation::NeutralSentiment { link, reason } => {
                write!(f, "article {} scored neutral: {}", link, reason)
            }
            Degradation::HistoryNotPersisted(reason) => write!(f, "score not persisted: {}", reason),
            Degradation::ReportNotSaved(reason) => write!(f, "report not saved: {}", reason),
            Degradation::AlertNotDelivered(outcome) => write!(f, "alert not delivered: {}", outcome),
        }
    }
}

/// What happened to the alert of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertOutcome {
    NotRequired,
    Sent,
    /// The alert was due but could not be attempted, e.g. missing credentials.
    Skipped(String),
    Failed(String),
}

impl fmt::Display for AlertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertOutcome::NotRequired => f.write_str("not required"),
            AlertOutcome::Sent => f.write_str("sent"),
            AlertOutcome::Skipped(reason) => write!(f, "skipped ({})", reason),
            AlertOutcome::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Which sentiment backend ended up serving a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScorerSelection {
    Primary(String),
    Fallback { scorer: String, reason: String },
}
