use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod handlers;
pub mod state;
pub mod summary;

pub use state::AppState;
pub use summary::{HistorySummary, Period, ScorePoint};

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/scores", get(handlers::list_scores))
        .route("/api/summary", get(handlers::get_summary))
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::{create_app, AppState, Period};
    pub use rep_core::{Error, Result};
}
