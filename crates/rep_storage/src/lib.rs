use std::sync::Arc;

use rep_core::{HistoryStore, Settings};

pub mod backends;
pub mod report;

pub use backends::*;
pub use report::ReportWriter;

/// The file-backed history in the configured data directory.
pub fn create_history_store(settings: &Settings) -> Arc<dyn HistoryStore> {
    Arc::new(CsvHistoryStore::new(settings.history_file()))
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_history_store;
    pub use super::report::ReportWriter;
}
