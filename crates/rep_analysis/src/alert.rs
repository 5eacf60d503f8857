use std::fmt::Write;
use std::sync::Arc;

use rep_core::{AlertDecision, AlertOutcome, Notifier, ScoredArticle};

/// Alert when `score` is strictly below `threshold`.
///
/// Triggering articles are the negative ones, most negative first, at most `limit`.
pub fn decide(score: f64, threshold: f64, articles: &[ScoredArticle], limit: usize) -> AlertDecision {
    let mut negative: Vec<ScoredArticle> = articles
        .iter()
        .filter(|a| a.sentiment_score < 0.0)
        .cloned()
        .collect();
    negative.sort_by(|a, b| a.sentiment_score.total_cmp(&b.sentiment_score));
    negative.truncate(limit);

    AlertDecision {
        should_alert: score < threshold,
        score,
        threshold,
        triggering_articles: negative,
    }
}

/// Subject and plain-text body of the alert mail.
pub fn render_message(company: &str, decision: &AlertDecision, timestamp: &str) -> (String, String) {
    let subject = format!("RepScan Alert: {} reputation score {:.3}", company, decision.score);

    let mut body = String::new();
    let _ = writeln!(body, "Reputation alert for {}", company);
    let _ = writeln!(body);
    let _ = writeln!(body, "Score:     {:.3}", decision.score);
    let _ = writeln!(body, "Threshold: {:.3}", decision.threshold);
    let _ = writeln!(body, "Time:      {}", timestamp);

    if decision.triggering_articles.is_empty() {
        let _ = writeln!(body);
        let _ = writeln!(body, "No individual article scored negative.");
    } else {
        let _ = writeln!(body);
        let _ = writeln!(body, "Most negative articles:");
        for (i, article) in decision.triggering_articles.iter().enumerate() {
            let _ = writeln!(body);
            let _ = writeln!(body, "{}. {}", i + 1, article.title());
            let _ = writeln!(
                body,
                "   Sentiment: {:.3} ({})",
                article.sentiment_score, article.sentiment_label
            );
            let _ = writeln!(body, "   Link: {}", article.link());
        }
    }
    (subject, body)
}

/// Sends the alert of a decision through the configured notifier, if any.
pub struct AlertDispatcher {
    notifier: Option<Arc<dyn Notifier>>,
    company: String,
}

impl AlertDispatcher {
    pub fn new(notifier: Option<Arc<dyn Notifier>>, company: impl Into<String>) -> Self {
        Self {
            notifier,
            company: company.into(),
        }
    }

    pub async fn dispatch(&self, decision: &AlertDecision, timestamp: &str) -> AlertOutcome {
        if !decision.should_alert {
            tracing::info!(
                "✅ Score {:.3} is not below threshold {:.3}, no alert",
                decision.score,
                decision.threshold
            );
            return AlertOutcome::NotRequired;
        }

        tracing::warn!(
            "🚨 Score {:.3} is below threshold {:.3}",
            decision.score,
            decision.threshold
        );
        let Some(notifier) = &self.notifier else {
            tracing::warn!("⚠️ Email credentials not configured, alert not sent");
            return AlertOutcome::Skipped("no notifier configured".to_string());
        };

        let (subject, body) = render_message(&self.company, decision, timestamp);
        match notifier.send(&subject, &body).await {
            Ok(true) => {
                tracing::info!("📧 Alert sent via {}", notifier.name());
                AlertOutcome::Sent
            }
            Ok(false) => {
                tracing::error!("❌ Alert rejected by {}", notifier.name());
                AlertOutcome::Failed(format!("{} rejected the message", notifier.name()))
            }
            Err(e) => {
                tracing::error!("❌ Failed to send alert: {}", e);
                AlertOutcome::Failed(e.to_string())
            }
        }
    }
}
