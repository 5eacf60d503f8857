use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;

use rep_core::{
    Article, Degradation, Error, MatchTier, MentionDetector, RawArticle, RelevantArticle, Result,
    TextNormalizer,
};
use rep_inference::literal_mentions;

/// Articles that passed the gate, in input order, plus the ones lost on the way.
#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub relevant: Vec<RelevantArticle>,
    pub degradations: Vec<Degradation>,
}

enum Verdict {
    Relevant(RelevantArticle),
    NotRelevant,
    Dropped(Degradation),
}

/// Normalizes raw articles and keeps the ones that concern a company.
///
/// A case-insensitive occurrence of the company name in the normalized title
/// or content is enough. Only when that fails is the mention detector asked,
/// and only organization-like entities naming the company count.
pub struct RelevanceFilter {
    normalizer: Arc<dyn TextNormalizer>,
    detector: Arc<dyn MentionDetector>,
    semaphore: Arc<Semaphore>,
}

impl RelevanceFilter {
    pub fn new(
        normalizer: Arc<dyn TextNormalizer>,
        detector: Arc<dyn MentionDetector>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            normalizer,
            detector,
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    pub fn normalize(&self, raw: RawArticle) -> Result<Article> {
        let normalized_title = self.normalizer.normalize(&raw.title)?;
        let normalized_content = self.normalizer.normalize(&raw.content)?;
        Ok(Article {
            title: raw.title,
            link: raw.link,
            published: raw.published,
            published_at: raw.published_at,
            raw_content: raw.content,
            normalized_title,
            normalized_content,
        })
    }

    /// The relevance gate for one normalized article.
    pub async fn check(&self, article: Article, company: &str) -> Result<Option<RelevantArticle>> {
        if article.normalized_content.trim().is_empty() || company.trim().is_empty() {
            return Ok(None);
        }
        // Match the name in the same form as the text it is searched in.
        let normalized = self
            .normalizer
            .normalize(company)
            .ok()
            .filter(|name| !name.trim().is_empty());
        let company = normalized.as_deref().unwrap_or(company);
        let text = article.full_text();

        let literal = literal_mentions(&text, company);
        if !literal.is_empty() {
            return Ok(Some(RelevantArticle {
                article,
                matched_by: MatchTier::Literal,
                mentions: literal,
            }));
        }

        let mentions: Vec<_> = self
            .detector
            .detect_mentions(&text, company)
            .await
            .map_err(|e| Error::Detection(format!("{} detector: {}", self.detector.name(), e)))?
            .into_iter()
            .filter(|m| m.is_organization_like() && m.names(company))
            .collect();

        if mentions.is_empty() {
            Ok(None)
        } else {
            Ok(Some(RelevantArticle {
                article,
                matched_by: MatchTier::Detector,
                mentions,
            }))
        }
    }

    async fn judge(&self, index: usize, total: usize, raw: RawArticle, company: &str) -> Verdict {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                return Verdict::Dropped(Degradation::ArticleDropped {
                    link: raw.link,
                    reason: e.to_string(),
                })
            }
        };
        tracing::info!("📰 Article {}/{} analysis: {}", index + 1, total, raw.title);

        let link = raw.link.clone();
        let article = match self.normalize(raw) {
            Ok(article) => article,
            Err(e) => {
                tracing::warn!("⚠️ Skipping {}: normalization failed: {}", link, e);
                return Verdict::Dropped(Degradation::ArticleDropped {
                    link,
                    reason: e.to_string(),
                });
            }
        };

        match self.check(article, company).await {
            Ok(Some(relevant)) => Verdict::Relevant(relevant),
            Ok(None) => Verdict::NotRelevant,
            Err(e) => {
                // No entities found for this article.
                tracing::warn!("⚠️ Mention detection failed for {}: {}", link, e);
                Verdict::Dropped(Degradation::ArticleDropped {
                    link,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Order-preserving subsequence of `articles` that concerns `company`.
    pub async fn filter(&self, articles: Vec<RawArticle>, company: &str) -> FilterOutcome {
        let total = articles.len();
        let verdicts = join_all(
            articles
                .into_iter()
                .enumerate()
                .map(|(i, raw)| self.judge(i, total, raw, company)),
        )
        .await;

        let mut outcome = FilterOutcome::default();
        for verdict in verdicts {
            match verdict {
                Verdict::Relevant(relevant) => outcome.relevant.push(relevant),
                Verdict::NotRelevant => {}
                Verdict::Dropped(degradation) => outcome.degradations.push(degradation),
            }
        }
        tracing::info!(
            "🎯 {} of {} articles mention {}",
            outcome.relevant.len(),
            total,
            company
        );
        outcome
    }
}
