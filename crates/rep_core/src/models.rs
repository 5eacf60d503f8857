use async_trait::async_trait;
use crate::types::{LabelScheme, Mention, RawArticle, SentimentLabel};
use crate::Result;

#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    fn name(&self) -> &str;

    /// Collect every article the feed currently lists.
    ///
    /// An `Err` means the feed itself could not be read. Articles whose page
    /// could not be downloaded are left out of the returned list.
    async fn collect_articles(&self) -> Result<Vec<RawArticle>>;
}

pub trait TextNormalizer: Send + Sync {
    /// Strip markup, URLs and noise from raw text.
    fn normalize(&self, text: &str) -> Result<String>;
}

#[async_trait]
pub trait MentionDetector: Send + Sync {
    fn name(&self) -> &str;

    /// Entities in `text` that name `company`, with surrounding context.
    async fn detect_mentions(&self, text: &str, company: &str) -> Result<Vec<Mention>>;

    async fn is_mentioned(&self, text: &str, company: &str) -> Result<bool> {
        if text.is_empty() {
            return Ok(false);
        }
        if text.to_lowercase().contains(&company.to_lowercase()) {
            return Ok(true);
        }
        let mentions = self.detect_mentions(text, company).await?;
        Ok(mentions
            .iter()
            .any(|m| m.is_organization_like() && m.names(company)))
    }
}

#[async_trait]
pub trait SentimentScorer: Send + Sync {
    fn name(&self) -> &str;

    /// Sentiment of `text` in [-1, 1].
    async fn score(&self, text: &str) -> Result<f64>;

    fn label_scheme(&self) -> LabelScheme {
        LabelScheme::default()
    }

    fn label(&self, score: f64) -> SentimentLabel {
        self.label_scheme().label(score)
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver a message. `Ok(false)` means the channel refused it.
    async fn send(&self, subject: &str, body: &str) -> Result<bool>;
}
