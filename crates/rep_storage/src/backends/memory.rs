use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use rep_core::{HistoryRecord, HistoryStore, Result};

/// Process-local history, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    records: Arc<RwLock<Vec<HistoryRecord>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<HistoryRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append(&self, score: f64, timestamp: &str) -> Result<()> {
        let mut records = self.records.write().await;
        records.push(HistoryRecord::new(timestamp, score));
        Ok(())
    }

    async fn read_all(&self) -> Vec<HistoryRecord> {
        self.records.read().await.clone()
    }
}
