use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

use rep_core::{Error, LabelScheme, Result, SentimentScorer, Settings};

/// Longest input, in characters, sent to the model.
pub const MAX_INPUT_CHARS: usize = 512;

#[derive(Serialize)]
struct ClassificationRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassificationResponse {
    fn best(self) -> Option<LabelScore> {
        let candidates = match self {
            ClassificationResponse::Nested(outer) => outer.into_iter().flatten().collect::<Vec<_>>(),
            ClassificationResponse::Flat(inner) => inner,
        };
        candidates
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

/// Map a classifier label and its confidence onto [-1, 1].
pub fn label_to_score(label: &str, confidence: f64) -> f64 {
    let label = label.trim().to_lowercase();
    let confidence = confidence.clamp(0.0, 1.0);

    // "1 star" .. "5 stars"
    if let Some(stars) = label
        .split_whitespace()
        .next()
        .filter(|_| label.contains("star"))
        .and_then(|n| n.parse::<f64>().ok())
    {
        return ((stars - 3.0) / 2.0).clamp(-1.0, 1.0);
    }

    if label.starts_with("pos") {
        confidence
    } else if label.starts_with("neg") {
        -confidence
    } else {
        0.0
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

/// Sentiment from a hosted text-classification model.
pub struct RemoteScorer {
    client: Client,
    endpoint: String,
    token: Option<String>,
    scheme: LabelScheme,
}

impl fmt::Debug for RemoteScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteScorer")
            .field("client", &"<reqwest::Client>")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RemoteScorer {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let endpoint = format!(
            "{}/{}",
            settings.inference_url.trim_end_matches('/'),
            settings.sentiment_model
        );
        url::Url::parse(&endpoint).map_err(|e| Error::InvalidUrl(format!("{}: {}", endpoint, e)))?;
        let client = Client::builder().timeout(settings.request_timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            token: settings.inference_token.clone(),
            scheme: settings.label_scheme,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SentimentScorer for RemoteScorer {
    fn name(&self) -> &str {
        "remote"
    }

    async fn score(&self, text: &str) -> Result<f64> {
        if text.trim().is_empty() {
            return Ok(0.0);
        }
        let request = ClassificationRequest {
            inputs: truncate_chars(text, MAX_INPUT_CHARS),
        };
        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        let response = builder
            .send()
            .await?
            .error_for_status()?
            .json::<ClassificationResponse>()
            .await
            .map_err(|e| Error::Inference(format!("Unexpected classifier response: {}", e)))?;

        let best = response
            .best()
            .ok_or_else(|| Error::Inference("Classifier returned no labels".to_string()))?;
        Ok(label_to_score(&best.label, best.score))
    }

    fn label_scheme(&self) -> LabelScheme {
        self.scheme
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_to_score() {
        assert_eq!(label_to_score("POSITIVE", 0.9), 0.9);
        assert_eq!(label_to_score("negative", 0.8), -0.8);
        assert_eq!(label_to_score("neutral", 0.99), 0.0);
        assert_eq!(label_to_score("5 stars", 0.4), 1.0);
        assert_eq!(label_to_score("1 star", 0.4), -1.0);
        assert_eq!(label_to_score("3 stars", 0.4), 0.0);
        assert_eq!(label_to_score("LABEL_7", 0.4), 0.0);
        assert_eq!(label_to_score("positive", 1.7), 1.0);
    }

    #[test]
    fn test_best_label() {
        let nested: ClassificationResponse = serde_json::from_str(
            r#"[[{"label": "negative", "score": 0.7}, {"label": "positive", "score": 0.3}]]"#,
        )
        .unwrap();
        assert_eq!(nested.best().unwrap().label, "negative");

        let flat: ClassificationResponse =
            serde_json::from_str(r#"[{"label": "positive", "score": 0.6}]"#).unwrap();
        assert_eq!(flat.best().unwrap().label, "positive");

        let empty: ClassificationResponse = serde_json::from_str("[]").unwrap();
        assert!(empty.best().is_none());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("àèìòù", 3), "àèì");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[tokio::test]
    async fn test_empty_text_is_neutral_without_request() {
        let scorer = RemoteScorer::from_settings(&Settings {
            inference_url: "http://127.0.0.1:9".to_string(),
            ..Settings::default()
        })
        .unwrap();
        assert_eq!(scorer.score("  ").await.unwrap(), 0.0);
        assert!(scorer.score("Enel cresce").await.is_err());
        assert!(scorer.endpoint().ends_with("dbmdz/bert-base-italian-uncased-sentiment"));
    }
}
