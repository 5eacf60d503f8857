use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use rep_analysis::{Collaborators, Pipeline};
use rep_core::{
    AlertOutcome, ArticleFetcher, Degradation, Error, HistoryRecord, HistoryStore, Mention,
    MentionDetector, Notifier, RawArticle, Result, SentimentScorer, Settings, StopReason,
};
use rep_inference::TextPreprocessor;
use rep_storage::{MemoryHistoryStore, ReportWriter};

struct MockFetcher {
    articles: Option<Vec<RawArticle>>,
}

#[async_trait]
impl ArticleFetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn collect_articles(&self) -> Result<Vec<RawArticle>> {
        self.articles
            .clone()
            .ok_or_else(|| Error::Feed("connection reset".to_string()))
    }
}

#[derive(Default)]
struct OfflineDetector {
    calls: AtomicUsize,
}

#[async_trait]
impl MentionDetector for OfflineDetector {
    fn name(&self) -> &str {
        "offline"
    }

    async fn detect_mentions(&self, _text: &str, _company: &str) -> Result<Vec<Mention>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Detection("model not loaded".to_string()))
    }
}

/// Scores by exact normalized content; unknown text fails.
struct ScriptedScorer {
    scores: HashMap<String, f64>,
}

#[async_trait]
impl SentimentScorer for ScriptedScorer {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn score(&self, text: &str) -> Result<f64> {
        self.scores
            .get(text)
            .copied()
            .ok_or_else(|| Error::Inference(format!("no score for {}", text)))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, subject: &str, body: &str) -> Result<bool> {
        self.sent.lock().await.push((subject.to_string(), body.to_string()));
        Ok(true)
    }
}

struct BrokenHistory;

#[async_trait]
impl HistoryStore for BrokenHistory {
    fn name(&self) -> &str {
        "broken"
    }

    async fn append(&self, _score: f64, _timestamp: &str) -> Result<()> {
        Err(Error::Storage("disk full".to_string()))
    }

    async fn read_all(&self) -> Vec<HistoryRecord> {
        Vec::new()
    }
}

/// Normalized content of exactly `len` characters that names the company.
fn body(tag: char, len: usize) -> String {
    format!("Enel {}", tag.to_string().repeat(len - 5))
}

fn raw(title: &str, content: String) -> RawArticle {
    RawArticle {
        title: title.to_string(),
        link: format!("https://news.test/{}", title.to_lowercase().replace(' ', "-")),
        published: Some("Fri, 01 Mar 2024 08:00:00 GMT".to_string()),
        published_at: None,
        summary: String::new(),
        content,
    }
}

struct Harness {
    pipeline: Pipeline,
    history: MemoryHistoryStore,
    notifier: Arc<RecordingNotifier>,
    detector: Arc<OfflineDetector>,
    _dir: tempfile::TempDir,
}

fn harness(articles: Option<Vec<RawArticle>>, scores: &[(String, f64)]) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        data_dir: dir.path().to_path_buf(),
        ..Settings::default()
    };
    let history = MemoryHistoryStore::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let detector = Arc::new(OfflineDetector::default());
    let pipeline = Pipeline::new(
        &settings,
        Collaborators {
            fetcher: Arc::new(MockFetcher { articles }),
            normalizer: Arc::new(TextPreprocessor::default()),
            detector: detector.clone(),
            scorer: Arc::new(ScriptedScorer {
                scores: scores.iter().cloned().collect(),
            }),
            history: Arc::new(history.clone()),
            notifier: Some(notifier.clone()),
            report: Some(ReportWriter::new(dir.path())),
        },
    );
    Harness {
        pipeline,
        history,
        notifier,
        detector,
        _dir: dir,
    }
}

#[tokio::test]
async fn test_weighted_score_without_alert() {
    let contents = [body('a', 120), body('b', 80), body('c', 250)];
    let articles = vec![
        raw("Piano industriale", contents[0].clone()),
        raw("Nuove tariffe", contents[1].clone()),
        raw("Accordo rinnovabili", contents[2].clone()),
    ];
    let scores = vec![
        (contents[0].clone(), 0.4),
        (contents[1].clone(), -0.1),
        (contents[2].clone(), 0.7),
    ];
    let h = harness(Some(articles), &scores);

    let report = h.pipeline.run().await.unwrap();
    let expected = (0.4 * 120.0 - 0.1 * 80.0 + 0.7 * 250.0) / 450.0;
    assert!((report.value() - expected).abs() < 1e-9);
    assert_eq!(report.stop, None);
    assert_eq!(report.score.contributing_article_count, 3);
    assert_eq!(report.alert, AlertOutcome::NotRequired);
    assert!(!report.decision.as_ref().unwrap().should_alert);
    assert!(report.degradations.is_empty());

    let history = h.history.read_all().await;
    assert_eq!(history.len(), 1);
    assert!((history[0].score - expected).abs() < 1e-9);
    assert_eq!(history[0].timestamp, report.score.timestamp());

    let titles: Vec<&str> = report.articles.iter().map(|a| a.title()).collect();
    assert_eq!(titles, vec!["Piano industriale", "Nuove tariffe", "Accordo rinnovabili"]);

    let path = report.report_path.unwrap();
    let written = std::fs::read_to_string(path).unwrap();
    assert_eq!(written.lines().count(), 4);
    assert!(h.notifier.sent.lock().await.is_empty());
}

#[tokio::test]
async fn test_negative_score_triggers_alert() {
    let contents = [body('a', 100), body('b', 100), body('c', 100)];
    let articles = vec![
        raw("Blackout a Roma", contents[0].clone()),
        raw("Multa antitrust", contents[1].clone()),
        raw("Nuovo impianto", contents[2].clone()),
    ];
    let scores = vec![
        (contents[0].clone(), -0.9),
        (contents[1].clone(), -0.7),
        (contents[2].clone(), 0.2),
    ];
    let h = harness(Some(articles), &scores);

    let report = h.pipeline.run().await.unwrap();
    assert!((report.value() - (-1.4 / 3.0)).abs() < 1e-9);
    assert_eq!(report.alert, AlertOutcome::Sent);

    let decision = report.decision.unwrap();
    assert!(decision.should_alert);
    let triggering: Vec<f64> = decision
        .triggering_articles
        .iter()
        .map(|a| a.sentiment_score)
        .collect();
    assert_eq!(triggering, vec![-0.9, -0.7]);

    let sent = h.notifier.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].0.contains("Enel"));
    assert!(sent[0].1.contains("Blackout a Roma"));
    assert!(sent[0].1.contains("https://news.test/multa-antitrust"));
    assert!(!sent[0].1.contains("Nuovo impianto"));
}

#[tokio::test]
async fn test_no_articles_stops_with_zero() {
    let h = harness(Some(Vec::new()), &[]);
    let report = h.pipeline.run().await.unwrap();
    assert_eq!(report.value(), 0.0);
    assert_eq!(report.stop, Some(StopReason::NoArticles));
    assert!(h.history.is_empty().await);
    assert!(report.report_path.is_none());
}

#[tokio::test]
async fn test_feed_failure_degrades_to_no_articles() {
    let h = harness(None, &[]);
    assert_eq!(h.pipeline.run_score().await.unwrap(), 0.0);

    let report = h.pipeline.run().await.unwrap();
    assert_eq!(report.stop, Some(StopReason::NoArticles));
    assert!(matches!(
        report.degradations.as_slice(),
        [Degradation::FeedUnavailable(_)]
    ));
}

#[tokio::test]
async fn test_no_relevant_articles_stops_with_zero() {
    let articles = vec![raw("Meteo", "Sole su tutta la penisola".to_string())];
    let h = harness(Some(articles), &[]);
    let report = h.pipeline.run().await.unwrap();
    assert_eq!(report.value(), 0.0);
    assert_eq!(report.stop, Some(StopReason::NoRelevantArticles));
    assert_eq!(report.fetched, 1);
    assert!(h.history.is_empty().await);
}

#[tokio::test]
async fn test_company_name_is_relevant_without_detector() {
    let content = "La società enel annuncia il dividendo".to_string();
    let h = harness(Some(vec![raw("Dividendo", content.clone())]), &[(content, 0.5)]);

    let report = h.pipeline.run().await.unwrap();
    assert_eq!(report.articles.len(), 1);
    assert_eq!(report.value(), 0.5);
    assert_eq!(h.detector.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_scoring_failure_counts_as_neutral() {
    let known = body('a', 50);
    let unknown = body('b', 50);
    let articles = vec![raw("Uno", known.clone()), raw("Due", unknown)];
    let h = harness(Some(articles), &[(known, 0.8)]);

    let report = h.pipeline.run().await.unwrap();
    assert_eq!(report.articles[1].sentiment_score, 0.0);
    assert!((report.value() - 0.4).abs() < 1e-9);
    assert!(report
        .degradations
        .iter()
        .any(|d| matches!(d, Degradation::NeutralSentiment { link, .. } if link.ends_with("/due"))));
}

#[tokio::test]
async fn test_out_of_range_sentiment_is_fatal() {
    let content = body('a', 30);
    let h = harness(Some(vec![raw("Uno", content.clone())]), &[(content, 1.5)]);
    let err = h.pipeline.run().await.unwrap_err();
    assert!(err.is_fatal());
    assert!(h.history.is_empty().await);
}

#[tokio::test]
async fn test_persistence_and_notifier_gaps_do_not_stop_the_run() {
    let content = body('a', 40);
    let settings = Settings::default();
    let pipeline = Pipeline::new(
        &settings,
        Collaborators {
            fetcher: Arc::new(MockFetcher {
                articles: Some(vec![raw("Guasto", content.clone())]),
            }),
            normalizer: Arc::new(TextPreprocessor::default()),
            detector: Arc::new(OfflineDetector::default()),
            scorer: Arc::new(ScriptedScorer {
                scores: [(content, -0.8)].into_iter().collect(),
            }),
            history: Arc::new(BrokenHistory),
            notifier: None,
            report: None,
        },
    );

    let report = pipeline.run().await.unwrap();
    assert!((report.value() + 0.8).abs() < 1e-9);
    assert!(report.decision.as_ref().unwrap().should_alert);
    assert!(matches!(report.alert, AlertOutcome::Skipped(_)));
    assert!(report
        .degradations
        .iter()
        .any(|d| matches!(d, Degradation::HistoryNotPersisted(_))));
    assert!(report
        .degradations
        .iter()
        .any(|d| matches!(d, Degradation::AlertNotDelivered(AlertOutcome::Skipped(_)))));
    assert!(report.report_path.is_none());
}
