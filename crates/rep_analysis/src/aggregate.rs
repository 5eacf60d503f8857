use chrono::{DateTime, Utc};

use rep_core::{Error, ReputationScore, Result, ScoredArticle};

pub fn aggregate(articles: &[ScoredArticle]) -> Result<ReputationScore> {
    aggregate_at(articles, Utc::now())
}

/// Length-weighted mean sentiment.
///
/// Each article weighs as many characters as its normalized content. When
/// every article is empty they all weigh 1. No articles gives 0.0.
pub fn aggregate_at(articles: &[ScoredArticle], computed_at: DateTime<Utc>) -> Result<ReputationScore> {
    if articles.is_empty() {
        tracing::warn!("⚠️ No articles provided for reputation score calculation");
        return Ok(ReputationScore::empty(computed_at));
    }

    for article in articles {
        let s = article.sentiment_score;
        if !s.is_finite() || !(-1.0..=1.0).contains(&s) {
            return Err(Error::InvariantViolation(format!(
                "sentiment {} of {} is outside [-1, 1]",
                s,
                article.link()
            )));
        }
    }

    let mut weights: Vec<f64> = articles.iter().map(|a| a.content_length() as f64).collect();
    if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(Error::InvariantViolation(format!("invalid article weight {}", w)));
    }

    let mut total: f64 = weights.iter().sum();
    if total == 0.0 {
        tracing::warn!("⚠️ Total weight is zero, using equal weights for all articles");
        weights = vec![1.0; articles.len()];
        total = articles.len() as f64;
    }

    let weighted: f64 = articles
        .iter()
        .zip(&weights)
        .map(|(a, w)| a.sentiment_score * w)
        .sum();
    // Rounding can push a convex combination a hair past the bounds.
    let value = (weighted / total).clamp(-1.0, 1.0);

    tracing::info!("📊 Calculated reputation score: {:.3}", value);
    Ok(ReputationScore {
        value,
        computed_at,
        contributing_article_count: articles.len(),
    })
}
