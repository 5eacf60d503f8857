use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use rep_core::{Error, Result, ScoredArticle, TIMESTAMP_FORMAT};

#[derive(Serialize)]
struct ReportRow<'a> {
    timestamp: &'a str,
    title: &'a str,
    link: &'a str,
    sentiment_score: f64,
    sentiment_label: String,
    published: &'a str,
}

/// Writes the per-run `detailed_results_<YYYYmmdd_HHMMSS>.csv` files.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(at: DateTime<Utc>) -> String {
        format!("detailed_results_{}.csv", at.format("%Y%m%d_%H%M%S"))
    }

    /// One row per article, in the order given. Returns the written path.
    pub async fn write(&self, at: DateTime<Utc>, articles: &[ScoredArticle]) -> Result<PathBuf> {
        let path = self.dir.join(Self::file_name(at));
        let contents = Self::render(at, articles)?;
        let dir = self.dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            fs::create_dir_all(&dir)?;
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(&contents)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| Error::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| Error::Storage(format!("report task failed: {}", e)))??;
        Ok(path)
    }

    fn render(at: DateTime<Utc>, articles: &[ScoredArticle]) -> Result<Vec<u8>> {
        let timestamp = at.format(TIMESTAMP_FORMAT).to_string();
        let mut writer = csv::Writer::from_writer(Vec::new());
        if articles.is_empty() {
            writer.write_record([
                "timestamp",
                "title",
                "link",
                "sentiment_score",
                "sentiment_label",
                "published",
            ])?;
        }
        for article in articles {
            writer.serialize(ReportRow {
                timestamp: &timestamp,
                title: article.title(),
                link: article.link(),
                sentiment_score: article.sentiment_score,
                sentiment_label: article.sentiment_label.to_string(),
                published: article.article().published.as_deref().unwrap_or(""),
            })?;
        }
        writer
            .into_inner()
            .map_err(|e| Error::Storage(format!("unable to render report: {}", e)))
    }
}
