use async_trait::async_trait;
use fd_lock::RwLock;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use rep_core::{Error, HistoryRecord, HistoryStore, Result};

const HEADER: &str = "timestamp,score\n";

/// `timestamp,score` rows in a CSV file.
///
/// Appends hold an exclusive advisory lock on a sidecar `<file>.lock` while
/// they rewrite the file through a temporary copy, so concurrent runs never
/// lose rows and an interrupted write leaves the previous file in place.
#[derive(Debug, Clone)]
pub struct CsvHistoryStore {
    path: PathBuf,
}

impl CsvHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        path.with_file_name(name)
    }

    fn parent_dir(path: &Path) -> PathBuf {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn append_blocking(path: &Path, record: &HistoryRecord) -> Result<()> {
        let dir = Self::parent_dir(path);
        fs::create_dir_all(&dir)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(Self::lock_path(path))?;
        let mut lock = RwLock::new(lock_file);
        let _guard = lock.write()?;

        let existing = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut tmp = NamedTempFile::new_in(&dir)?;
        if existing.is_empty() {
            tmp.write_all(HEADER.as_bytes())?;
        } else {
            tmp.write_all(&existing)?;
            if !existing.ends_with(b"\n") {
                tmp.write_all(b"\n")?;
            }
        }
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(tmp.as_file_mut());
            let score = record.score.to_string();
            writer.write_record([record.timestamp.as_str(), score.as_str()])?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    // Appends replace the file by rename, so readers never see a partial row.
    fn read_blocking(path: &Path) -> Result<Vec<HistoryRecord>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut records = Vec::new();
        for (index, row) in reader.deserialize::<HistoryRecord>().enumerate() {
            match row {
                Ok(record) => records.push(record),
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => tracing::warn!(
                    "⚠️ Skipping malformed history row {} in {}: {}",
                    index + 1,
                    path.display(),
                    e
                ),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl HistoryStore for CsvHistoryStore {
    fn name(&self) -> &str {
        "csv"
    }

    async fn append(&self, score: f64, timestamp: &str) -> Result<()> {
        let path = self.path.clone();
        let record = HistoryRecord::new(timestamp, score);
        tokio::task::spawn_blocking(move || Self::append_blocking(&path, &record))
            .await
            .map_err(|e| Error::Storage(format!("history append task failed: {}", e)))?
    }

    async fn read_all(&self) -> Vec<HistoryRecord> {
        let path = self.path.clone();
        match tokio::task::spawn_blocking(move || Self::read_blocking(&path)).await {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => {
                tracing::warn!("⚠️ Unable to read history from {}: {}", self.path.display(), e);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("⚠️ History read task failed: {}", e);
                Vec::new()
            }
        }
    }
}
