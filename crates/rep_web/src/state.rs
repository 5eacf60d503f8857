use std::sync::Arc;
use rep_core::{HistoryStore, Settings};

pub struct AppState {
    pub history: Arc<dyn HistoryStore>,
    pub settings: Settings,
}
