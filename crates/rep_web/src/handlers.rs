use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::summary::{HistorySummary, Period, ScorePoint};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

impl PeriodQuery {
    fn period(&self) -> Result<Period, (StatusCode, String)> {
        match &self.period {
            Some(p) => p.parse().map_err(|e| (StatusCode::BAD_REQUEST, e)),
            None => Ok(Period::default()),
        }
    }
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn list_scores(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<ScorePoint>>, (StatusCode, String)> {
    let period = query.period()?;
    let records = period.select(state.history.read_all().await, Utc::now().naive_utc());
    let scheme = state.settings.label_scheme;
    Ok(Json(
        records
            .into_iter()
            .map(|r| ScorePoint::from_record(r, &scheme))
            .collect(),
    ))
}

pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<HistorySummary>, (StatusCode, String)> {
    let period = query.period()?;
    let records = period.select(state.history.read_all().await, Utc::now().naive_utc());
    tracing::debug!("📈 Summary over {} records ({})", records.len(), period);
    Ok(Json(HistorySummary::compute(
        period,
        &records,
        state.settings.alert_threshold,
        &state.settings.label_scheme,
    )))
}
