use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

use rep_core::{Error, Mention, MentionDetector, Result, Settings};

use super::{context_window, CONTEXT_RADIUS};

#[derive(Serialize)]
struct TokenClassificationRequest<'a> {
    inputs: &'a str,
    parameters: TokenClassificationParameters,
}

#[derive(Serialize)]
struct TokenClassificationParameters {
    aggregation_strategy: &'static str,
}

#[derive(Debug, Deserialize)]
struct EntitySpan {
    #[serde(alias = "entity")]
    entity_group: String,
    word: String,
    start: Option<usize>,
    end: Option<usize>,
}

/// Named-entity recognition through a hosted token-classification model.
pub struct RemoteMentionDetector {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl fmt::Debug for RemoteMentionDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteMentionDetector")
            .field("client", &"<reqwest::Client>")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RemoteMentionDetector {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let endpoint = format!(
            "{}/{}",
            settings.inference_url.trim_end_matches('/'),
            settings.ner_model
        );
        url::Url::parse(&endpoint).map_err(|e| Error::InvalidUrl(format!("{}: {}", endpoint, e)))?;
        let client = Client::builder().timeout(settings.request_timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            token: settings.inference_token.clone(),
        })
    }

    fn to_mention(text: &str, span: EntitySpan) -> Mention {
        // Offsets come back as character positions.
        let byte_at = |pos: usize| text.char_indices().nth(pos).map_or(text.len(), |(i, _)| i);
        let context = match (span.start, span.end) {
            (Some(start), Some(end)) if start <= end => {
                context_window(text, byte_at(start), byte_at(end), CONTEXT_RADIUS)
            }
            _ => String::new(),
        };
        Mention {
            text: span.word.trim().to_string(),
            context,
            entity_type: span.entity_group.trim_start_matches("B-").trim_start_matches("I-").to_uppercase(),
        }
    }
}

#[async_trait]
impl MentionDetector for RemoteMentionDetector {
    fn name(&self) -> &str {
        "remote"
    }

    async fn detect_mentions(&self, text: &str, company: &str) -> Result<Vec<Mention>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let request = TokenClassificationRequest {
            inputs: text,
            parameters: TokenClassificationParameters {
                aggregation_strategy: "simple",
            },
        };
        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        let spans = builder
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<EntitySpan>>()
            .await
            .map_err(|e| Error::Detection(format!("Unexpected NER response: {}", e)))?;

        Ok(spans
            .into_iter()
            .map(|span| Self::to_mention(text, span))
            .filter(|m| m.is_organization_like() && m.names(company))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_settings() {
        let detector = RemoteMentionDetector::from_settings(&Settings {
            inference_token: Some("hf_secret".to_string()),
            ..Settings::default()
        })
        .unwrap();
        assert!(detector.endpoint.ends_with("/osiria/bert-italian-cased-ner"));
        assert!(!format!("{:?}", detector).contains("hf_secret"));
    }

    #[test]
    fn test_span_to_mention() {
        let text = "Oggi Enel SpA cresce";
        let span: EntitySpan = serde_json::from_str(
            r#"{"entity_group": "ORG", "word": " Enel SpA", "start": 5, "end": 13, "score": 0.98}"#,
        )
        .unwrap();
        let mention = RemoteMentionDetector::to_mention(text, span);
        assert_eq!(mention.text, "Enel SpA");
        assert_eq!(mention.entity_type, "ORG");
        assert_eq!(mention.context, text);
        assert!(mention.is_organization_like());

        let span: EntitySpan =
            serde_json::from_str(r#"{"entity": "B-org", "word": "Enel"}"#).unwrap();
        let mention = RemoteMentionDetector::to_mention(text, span);
        assert_eq!(mention.entity_type, "ORG");
        assert!(mention.context.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let detector = RemoteMentionDetector::from_settings(&Settings {
            inference_url: "http://127.0.0.1:9".to_string(),
            ..Settings::default()
        })
        .unwrap();
        assert!(detector.detect_mentions("Enel", "Enel").await.is_err());
    }
}
