use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

use rep_core::{Error, LabelScheme, Result, ScorerKind, ScorerSelection, SentimentScorer, Settings};

pub mod lexicon;
pub mod remote;

pub use lexicon::LexiconScorer;
pub use remote::RemoteScorer;

const PROBE_TEXT: &str = "test";

/// Serves from `primary` unless a one-time probe shows it is unusable, in
/// which case `fallback` answers for the rest of the process.
pub struct FallbackScorer {
    primary: Arc<dyn SentimentScorer>,
    fallback: Arc<dyn SentimentScorer>,
    selection: OnceCell<ScorerSelection>,
}

impl fmt::Debug for FallbackScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackScorer")
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback.name())
            .field("selection", &self.selection.get())
            .finish()
    }
}

impl FallbackScorer {
    pub fn new(primary: Arc<dyn SentimentScorer>, fallback: Arc<dyn SentimentScorer>) -> Self {
        Self {
            primary,
            fallback,
            selection: OnceCell::new(),
        }
    }

    /// `None` until the first text has been scored.
    pub fn selection(&self) -> Option<&ScorerSelection> {
        self.selection.get()
    }

    async fn select(&self) -> &ScorerSelection {
        self.selection
            .get_or_init(|| async {
                match self.primary.score(PROBE_TEXT).await {
                    Ok(_) => {
                        tracing::info!("🧠 Sentiment model '{}' is available", self.primary.name());
                        ScorerSelection::Primary(self.primary.name().to_string())
                    }
                    Err(e) => {
                        tracing::warn!(
                            "⚠️ Sentiment model '{}' unavailable ({}), using '{}' instead",
                            self.primary.name(),
                            e,
                            self.fallback.name()
                        );
                        ScorerSelection::Fallback {
                            scorer: self.fallback.name().to_string(),
                            reason: e.to_string(),
                        }
                    }
                }
            })
            .await
    }
}

#[async_trait]
impl SentimentScorer for FallbackScorer {
    fn name(&self) -> &str {
        match self.selection.get() {
            Some(ScorerSelection::Fallback { .. }) => self.fallback.name(),
            _ => self.primary.name(),
        }
    }

    async fn score(&self, text: &str) -> Result<f64> {
        match self.select().await {
            ScorerSelection::Primary(_) => self.primary.score(text).await,
            ScorerSelection::Fallback { .. } => self.fallback.score(text).await,
        }
    }

    fn label_scheme(&self) -> LabelScheme {
        self.primary.label_scheme()
    }
}

pub fn create_scorer(settings: &Settings) -> Result<Arc<dyn SentimentScorer>> {
    let lexicon = || Arc::new(LexiconScorer::new(settings.label_scheme));
    let remote = || {
        RemoteScorer::from_settings(settings)
            .map_err(|e| Error::Config(format!("Unable to create sentiment scorer: {}", e)))
    };
    match settings.scorer {
        ScorerKind::Lexicon => Ok(lexicon()),
        ScorerKind::Remote => Ok(Arc::new(remote()?)),
        ScorerKind::Auto => Ok(Arc::new(FallbackScorer::new(Arc::new(remote()?), lexicon()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockScorer {
        name: &'static str,
        value: Option<f64>,
        calls: AtomicUsize,
    }

    impl MockScorer {
        fn new(name: &'static str, value: Option<f64>) -> Arc<Self> {
            Arc::new(Self {
                name,
                value,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SentimentScorer for MockScorer {
        fn name(&self) -> &str {
            self.name
        }

        async fn score(&self, _text: &str) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.value
                .ok_or_else(|| Error::Inference("model offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_primary_kept_when_probe_succeeds() {
        let primary = MockScorer::new("primary", Some(0.5));
        let fallback = MockScorer::new("fallback", Some(-0.5));
        let scorer = FallbackScorer::new(primary.clone(), fallback.clone());

        assert!(scorer.selection().is_none());
        assert_eq!(scorer.score("a").await.unwrap(), 0.5);
        assert_eq!(scorer.score("b").await.unwrap(), 0.5);
        assert_eq!(
            scorer.selection(),
            Some(&ScorerSelection::Primary("primary".to_string()))
        );
        // One probe plus two real calls.
        assert_eq!(primary.calls.load(Ordering::SeqCst), 3);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_used_for_rest_of_process() {
        let primary = MockScorer::new("primary", None);
        let fallback = MockScorer::new("fallback", Some(-0.5));
        let scorer = FallbackScorer::new(primary.clone(), fallback.clone());

        assert_eq!(scorer.score("a").await.unwrap(), -0.5);
        assert_eq!(scorer.score("b").await.unwrap(), -0.5);
        assert_eq!(scorer.name(), "fallback");
        assert!(matches!(
            scorer.selection(),
            Some(ScorerSelection::Fallback { scorer, .. }) if scorer == "fallback"
        ));
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_create_scorer() {
        let settings = Settings {
            scorer: ScorerKind::Lexicon,
            ..Settings::default()
        };
        assert_eq!(create_scorer(&settings).unwrap().name(), "lexicon");

        let settings = Settings {
            scorer: ScorerKind::Remote,
            ..Settings::default()
        };
        assert_eq!(create_scorer(&settings).unwrap().name(), "remote");

        let settings = Settings {
            scorer: ScorerKind::Auto,
            label_scheme: LabelScheme::five_way(),
            ..Settings::default()
        };
        let scorer = create_scorer(&settings).unwrap();
        assert_eq!(scorer.label_scheme(), LabelScheme::five_way());
    }
}
