use async_trait::async_trait;
use crate::types::HistoryRecord;
use crate::Result;

#[async_trait]
pub trait HistoryStore: Send + Sync {
    fn name(&self) -> &str;

    /// Append exactly one `(timestamp, score)` row.
    async fn append(&self, score: f64, timestamp: &str) -> Result<()>;

    /// Every stored row in storage order. A missing or unreadable store reads as empty.
    async fn read_all(&self) -> Vec<HistoryRecord>;
}
