pub mod config;
pub mod error;
pub mod models;
pub mod outcome;
pub mod storage;
pub mod types;

pub use config::{DetectorKind, EmailSettings, ScorerKind, Settings};
pub use error::{Error, Result};
pub use models::{ArticleFetcher, MentionDetector, Notifier, SentimentScorer, TextNormalizer};
pub use outcome::{AlertOutcome, Degradation, ScorerSelection, StopReason};
pub use storage::HistoryStore;
pub use types::*;
