pub mod mentions;
pub mod models;
pub mod normalize;

pub use mentions::{create_detector, literal_mentions, HeuristicMentionDetector};
pub use models::{create_scorer, FallbackScorer, LexiconScorer, RemoteScorer};
pub use normalize::TextPreprocessor;

pub mod prelude {
    pub use super::mentions::create_detector;
    pub use super::models::create_scorer;
    pub use super::normalize::TextPreprocessor;
    pub use rep_core::{MentionDetector, SentimentScorer, TextNormalizer, Result, Error};
}
