use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

use rep_core::{
    AlertDecision, AlertOutcome, ArticleFetcher, Degradation, HistoryStore, MentionDetector,
    Notifier, RelevantArticle, ReputationScore, Result, ScoredArticle, SentimentScorer, Settings,
    StopReason, TextNormalizer, TIMESTAMP_FORMAT,
};
use rep_storage::ReportWriter;

use crate::aggregate::aggregate_at;
use crate::alert::{decide, AlertDispatcher};
use crate::relevance::RelevanceFilter;

/// Everything a pipeline talks to outside its own logic.
pub struct Collaborators {
    pub fetcher: Arc<dyn ArticleFetcher>,
    pub normalizer: Arc<dyn TextNormalizer>,
    pub detector: Arc<dyn MentionDetector>,
    pub scorer: Arc<dyn SentimentScorer>,
    pub history: Arc<dyn HistoryStore>,
    /// `None` when no credentials are configured.
    pub notifier: Option<Arc<dyn Notifier>>,
    pub report: Option<ReportWriter>,
}

/// What one run produced.
#[derive(Debug)]
pub struct RunReport {
    pub score: ReputationScore,
    pub stop: Option<StopReason>,
    pub fetched: usize,
    pub articles: Vec<ScoredArticle>,
    pub decision: Option<AlertDecision>,
    pub alert: AlertOutcome,
    pub report_path: Option<PathBuf>,
    pub degradations: Vec<Degradation>,
}

impl RunReport {
    fn stopped(at: DateTime<Utc>, reason: StopReason, fetched: usize, degradations: Vec<Degradation>) -> Self {
        Self {
            score: ReputationScore::empty(at),
            stop: Some(reason),
            fetched,
            articles: Vec::new(),
            decision: None,
            alert: AlertOutcome::NotRequired,
            report_path: None,
            degradations,
        }
    }

    pub fn value(&self) -> f64 {
        self.score.value
    }

    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

/// fetch → normalize + filter → score → aggregate → persist → alert → report.
pub struct Pipeline {
    fetcher: Arc<dyn ArticleFetcher>,
    filter: RelevanceFilter,
    scorer: Arc<dyn SentimentScorer>,
    history: Arc<dyn HistoryStore>,
    alerts: AlertDispatcher,
    report: Option<ReportWriter>,
    company: String,
    threshold: f64,
    triggering_limit: usize,
    semaphore: Arc<Semaphore>,
}

impl Pipeline {
    pub fn new(settings: &Settings, collaborators: Collaborators) -> Self {
        let Collaborators {
            fetcher,
            normalizer,
            detector,
            scorer,
            history,
            notifier,
            report,
        } = collaborators;
        Self {
            fetcher,
            filter: RelevanceFilter::new(normalizer, detector, settings.max_concurrency),
            scorer,
            history,
            alerts: AlertDispatcher::new(notifier, settings.target_company.clone()),
            report,
            company: settings.target_company.clone(),
            threshold: settings.alert_threshold,
            triggering_limit: settings.triggering_article_limit,
            semaphore: Arc::new(Semaphore::new(settings.max_concurrency.max(1))),
        }
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    /// The reputation score of one run, 0.0 when nothing relevant was found.
    pub async fn run_score(&self) -> Result<f64> {
        Ok(self.run().await?.value())
    }

    /// One complete run. Only a broken invariant makes this fail.
    pub async fn run(&self) -> Result<RunReport> {
        let started_at = Utc::now();
        let timestamp = started_at.format(TIMESTAMP_FORMAT).to_string();
        let mut degradations = Vec::new();
        tracing::info!("🚀 Starting RepScan analysis for {}", self.company);

        tracing::info!("📥 Step 1: collecting articles from {}", self.fetcher.name());
        let raw = match self.fetcher.collect_articles().await {
            Ok(articles) => articles,
            Err(e) => {
                tracing::error!("❌ Feed unavailable: {}", e);
                degradations.push(Degradation::FeedUnavailable(e.to_string()));
                Vec::new()
            }
        };
        let fetched = raw.len();
        if raw.is_empty() {
            tracing::warn!("⚠️ No articles collected, stopping the analysis");
            return Ok(RunReport::stopped(started_at, StopReason::NoArticles, 0, degradations));
        }

        tracing::info!("🔎 Step 2: preprocessing and filtering {} articles", fetched);
        let filtered = self.filter.filter(raw, &self.company).await;
        degradations.extend(filtered.degradations);
        if filtered.relevant.is_empty() {
            tracing::warn!("⚠️ No relevant articles found with {} mentions", self.company);
            return Ok(RunReport::stopped(
                started_at,
                StopReason::NoRelevantArticles,
                fetched,
                degradations,
            ));
        }

        tracing::info!("🧠 Step 3: scoring {} relevant articles", filtered.relevant.len());
        let (articles, fallbacks) = self.score_all(filtered.relevant).await;
        degradations.extend(fallbacks);

        let score = aggregate_at(&articles, started_at)?;

        tracing::info!("💾 Step 4: saving score {:.3} at {}", score.value, timestamp);
        if let Err(e) = self.history.append(score.value, &timestamp).await {
            tracing::error!("❌ Error while saving reputation score: {}", e);
            degradations.push(Degradation::HistoryNotPersisted(e.to_string()));
        }

        let decision = decide(score.value, self.threshold, &articles, self.triggering_limit);
        let alert = self.alerts.dispatch(&decision, &timestamp).await;
        if matches!(alert, AlertOutcome::Skipped(_) | AlertOutcome::Failed(_)) {
            degradations.push(Degradation::AlertNotDelivered(alert.clone()));
        }

        let report_path = match &self.report {
            Some(writer) => match writer.write(started_at, &articles).await {
                Ok(path) => {
                    tracing::info!("📝 Detailed results saved to {}", path.display());
                    Some(path)
                }
                Err(e) => {
                    tracing::error!("❌ Unable to save detailed results: {}", e);
                    degradations.push(Degradation::ReportNotSaved(e.to_string()));
                    None
                }
            },
            None => None,
        };

        for degradation in &degradations {
            tracing::warn!("⚠️ Degraded: {}", degradation);
        }
        tracing::info!(
            "✅ Analysis completed: score {:.3} from {} of {} articles",
            score.value,
            score.contributing_article_count,
            fetched
        );

        Ok(RunReport {
            score,
            stop: None,
            fetched,
            articles,
            decision: Some(decision),
            alert,
            report_path,
            degradations,
        })
    }

    async fn score_all(&self, relevant: Vec<RelevantArticle>) -> (Vec<ScoredArticle>, Vec<Degradation>) {
        let results = join_all(relevant.into_iter().map(|article| async move {
            let _permit = self.semaphore.acquire().await;
            let outcome = self.scorer.score(&article.article.normalized_content).await;
            (article, outcome)
        }))
        .await;

        let mut scored = Vec::with_capacity(results.len());
        let mut degradations = Vec::new();
        for (article, outcome) in results {
            let sentiment = match outcome {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Sentiment analysis failed for {}, using neutral: {}",
                        article.article.link,
                        e
                    );
                    degradations.push(Degradation::NeutralSentiment {
                        link: article.article.link.clone(),
                        reason: e.to_string(),
                    });
                    0.0
                }
            };
            let label = self.scorer.label(sentiment);
            scored.push(ScoredArticle::new(article, sentiment, label));
        }
        (scored, degradations)
    }
}
