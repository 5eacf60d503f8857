use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use rep_core::{ArticleFetcher, Error, RawArticle, Result, Settings};

use crate::content::extract_text;
use crate::logging::Logger;
use crate::rss::{parse_feed, FeedEntry};

/// Reads one RSS/Atom feed and downloads the page behind every entry.
pub struct RssFetcher {
    client: Client,
    feed_url: String,
    semaphore: Arc<Semaphore>,
    logger: Logger,
}

impl RssFetcher {
    pub fn new(feed_url: impl Into<String>, timeout: Duration, max_concurrency: usize) -> Result<Self> {
        let feed_url = feed_url.into();
        url::Url::parse(&feed_url).map_err(|e| Error::InvalidUrl(format!("{}: {}", feed_url, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("repscan/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            feed_url,
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
            logger: Logger::new().with_prefix("[feed]".to_string()),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.feed_url.clone(),
            settings.request_timeout,
            settings.max_concurrency,
        )
    }

    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    async fn fetch_feed(&self) -> Result<Vec<FeedEntry>> {
        self.logger.info(&format!("📡 Downloading feed from {}", self.feed_url));
        let body = self
            .client
            .get(&self.feed_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let entries = parse_feed(&body)?;
        if entries.is_empty() {
            self.logger.warn("No entries found in the feed");
        } else {
            self.logger.info(&format!("🗞️ {} entries found in the feed", entries.len()));
        }
        Ok(entries)
    }

    /// Text of the page at `url`. Any failure is reported as a fetch error for that page.
    async fn fetch_content(&self, url: &str) -> Result<String> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| Error::External(e.into()))?;
        let fetch_error = |e: reqwest::Error| Error::Fetch(format!("{}: {}", url, e));
        let html = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(fetch_error)?
            .text()
            .await
            .map_err(fetch_error)?;
        Ok(extract_text(&html))
    }

    async fn collect_entry(&self, entry: FeedEntry, logger: Logger) -> Option<RawArticle> {
        match self.fetch_content(&entry.link).await {
            Ok(content) => {
                let content = if content.trim().is_empty() {
                    logger.warn(&format!("No readable text at {}, using the feed summary", entry.link));
                    entry.summary.clone()
                } else {
                    content
                };
                logger.info(&format!("📰 Article collected: {}", entry.title));
                let published_at = entry.published_at();
                Some(RawArticle {
                    title: entry.title,
                    link: entry.link,
                    published: entry.published,
                    published_at,
                    summary: entry.summary,
                    content,
                })
            }
            Err(e) => {
                logger.error(&format!("Failed to download '{}': {}", entry.title, e));
                None
            }
        }
    }
}

#[async_trait]
impl ArticleFetcher for RssFetcher {
    fn name(&self) -> &str {
        "rss"
    }

    async fn collect_articles(&self) -> Result<Vec<RawArticle>> {
        let entries = self.fetch_feed().await?;
        let total = entries.len();

        let futures = entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| self.collect_entry(entry, self.logger.for_item(i, total)));
        let articles: Vec<RawArticle> = join_all(futures).await.into_iter().flatten().collect();

        if articles.len() < total {
            self.logger.warn(&format!(
                "{} of {} articles could not be downloaded",
                total - articles.len(),
                total
            ));
        }
        Ok(articles)
    }
}
