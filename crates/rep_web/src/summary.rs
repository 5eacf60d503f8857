use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use rep_core::{HistoryRecord, LabelScheme, SentimentLabel};

/// Look-back window of the dashboard views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl Period {
    pub fn window(&self) -> Option<Duration> {
        match self {
            Period::Week => Some(Duration::days(7)),
            Period::Month => Some(Duration::days(30)),
            Period::Quarter => Some(Duration::days(90)),
            Period::All => None,
        }
    }

    /// Records inside the window ending at `now`, in storage order.
    /// Rows without a readable timestamp only show up under `All`.
    pub fn select(&self, records: Vec<HistoryRecord>, now: NaiveDateTime) -> Vec<HistoryRecord> {
        let Some(window) = self.window() else {
            return records;
        };
        let since = now - window;
        records
            .into_iter()
            .filter(|r| r.parsed_timestamp().map_or(false, |t| t >= since))
            .collect()
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7d" | "week" => Ok(Period::Week),
            "30d" | "month" => Ok(Period::Month),
            "90d" | "quarter" => Ok(Period::Quarter),
            "all" | "" => Ok(Period::All),
            other => Err(format!("Unknown period: {} (expected 7d, 30d, 90d or all)", other)),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Period::Week => "7d",
            Period::Month => "30d",
            Period::Quarter => "90d",
            Period::All => "all",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorePoint {
    pub timestamp: String,
    pub score: f64,
    pub label: SentimentLabel,
}

impl ScorePoint {
    pub fn from_record(record: HistoryRecord, scheme: &LabelScheme) -> Self {
        Self {
            label: scheme.label(record.score),
            timestamp: record.timestamp,
            score: record.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub period: Period,
    pub count: usize,
    pub latest: Option<ScorePoint>,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub threshold: f64,
    pub below_threshold: usize,
}

impl HistorySummary {
    pub fn compute(period: Period, records: &[HistoryRecord], threshold: f64, scheme: &LabelScheme) -> Self {
        let scores: Vec<f64> = records.iter().map(|r| r.score).collect();
        let mean = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };
        Self {
            period,
            count: scores.len(),
            latest: records
                .last()
                .cloned()
                .map(|r| ScorePoint::from_record(r, scheme)),
            mean,
            min: scores.iter().copied().reduce(f64::min),
            max: scores.iter().copied().reduce(f64::max),
            threshold,
            below_threshold: scores.iter().filter(|s| **s < threshold).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-03-31 12:00:00", rep_core::TIMESTAMP_FORMAT).unwrap()
    }

    fn history() -> Vec<HistoryRecord> {
        vec![
            HistoryRecord::new("2023-12-01 09:00:00", 0.6),
            HistoryRecord::new("2024-02-15 09:00:00", -0.4),
            HistoryRecord::new("not a date", 0.0),
            HistoryRecord::new("2024-03-28 09:00:00", -0.1),
            HistoryRecord::new("2024-03-30 09:00:00", 0.3),
        ]
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("7d".parse::<Period>().unwrap(), Period::Week);
        assert_eq!("ALL".parse::<Period>().unwrap(), Period::All);
        assert!("1y".parse::<Period>().is_err());
        assert_eq!(Period::Quarter.to_string(), "90d");
    }

    #[test]
    fn test_period_selection() {
        assert_eq!(Period::Week.select(history(), now()).len(), 2);
        assert_eq!(Period::Month.select(history(), now()).len(), 2);
        assert_eq!(Period::Quarter.select(history(), now()).len(), 3);
        assert_eq!(Period::All.select(history(), now()).len(), 5);
    }

    #[test]
    fn test_summary() {
        let records = Period::Quarter.select(history(), now());
        let summary = HistorySummary::compute(Period::Quarter, &records, -0.3, &LabelScheme::default());
        assert_eq!(summary.count, 3);
        assert_eq!(summary.min, Some(-0.4));
        assert_eq!(summary.max, Some(0.3));
        assert_eq!(summary.below_threshold, 1);
        assert!((summary.mean.unwrap() - (-0.2 / 3.0)).abs() < 1e-9);
        let latest = summary.latest.unwrap();
        assert_eq!(latest.timestamp, "2024-03-30 09:00:00");
        assert_eq!(latest.label, SentimentLabel::Positive);

        let empty = HistorySummary::compute(Period::All, &[], -0.3, &LabelScheme::default());
        assert_eq!(empty.count, 0);
        assert!(empty.mean.is_none() && empty.latest.is_none());
    }
}
