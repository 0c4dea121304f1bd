//! The analysis pipeline behind every POST route: pick the source for the
//! requested date, classify live responses, and hand back records ready for
//! aggregation.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use feedpulse_ai::{SentimentClassifier, TopicClassifier};
use feedpulse_core::{
    ChartSeries, FeedbackRecord, OverallSentiment, ResponseRow, TopicGroups, TopicSummary,
    chart_series, overall_by_topic, parse_date, summarize_historical, summarize_live,
};
use feedpulse_store::{Loaded, StoreError};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::state::AppState;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("DATE is required")]
    MissingDate,

    #[error("invalid DATE {0:?}")]
    InvalidDate(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("classification failed: {0:#}")]
    Classifier(anyhow::Error),

    #[error("analysis task failed: {0}")]
    Task(String),
}

impl AnalyzeError {
    /// Problems with the request or the data, as opposed to the system.
    pub fn is_structural(&self) -> bool {
        match self {
            Self::MissingDate | Self::InvalidDate(_) => true,
            Self::Store(e) => e.is_structural(),
            Self::Classifier(_) | Self::Task(_) => false,
        }
    }

    fn status_code(&self) -> StatusCode {
        if self.is_structural() {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        if status.is_server_error() {
            error!(error = %message, "analysis failed");
        } else {
            warn!(error = %message, "analysis rejected");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Live,
    Historical,
}

/// Classified records for one date.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub mode: Mode,
    pub records: Vec<FeedbackRecord>,
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keep only records of `session`. Applied only when some record carries
    /// a session at all; a blank session means no filter.
    pub fn for_session(mut self, session: Option<&str>) -> Self {
        let Some(session) = session.map(str::trim).filter(|s| !s.is_empty()) else {
            return self;
        };
        if self.records.iter().all(|r| r.session.is_none()) {
            return self;
        }
        self.records
            .retain(|r| r.session.as_deref().map(str::trim) == Some(session));
        self
    }

    /// Topic summaries: first-appearance order with exemplars for live data,
    /// sorted pivot for historical data.
    pub fn summaries(&self) -> Vec<TopicSummary> {
        match self.mode {
            Mode::Live => summarize_live(&self.records),
            Mode::Historical => summarize_historical(&self.records),
        }
    }

    pub fn chart(&self) -> ChartSeries {
        chart_series(&self.records)
    }

    pub fn overall(&self) -> Vec<OverallSentiment> {
        overall_by_topic(&self.records)
    }
}

pub fn parse_request_date(raw: Option<&str>) -> Result<NaiveDate, AnalyzeError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(AnalyzeError::MissingDate)?;
    parse_date(raw).map_err(|_| AnalyzeError::InvalidDate(raw.to_string()))
}

/// Classify live responses into records.
///
/// The topic classifier sees every `topic_text` in one batch; each id is then
/// resolved to a group using the row's remark. Sentiment is scored per remark.
pub fn classify_responses(
    rows: &[ResponseRow],
    topics: &TopicGroups,
    topic_model: &dyn TopicClassifier,
    sentiment: &dyn SentimentClassifier,
) -> anyhow::Result<Vec<FeedbackRecord>> {
    let texts: Vec<&str> = rows.iter().map(|r| r.topic_text.as_str()).collect();
    let ids = topic_model.classify_batch(&texts)?;
    anyhow::ensure!(
        ids.len() == rows.len(),
        "{} returned {} topics for {} texts",
        topic_model.name(),
        ids.len(),
        rows.len()
    );

    rows.iter()
        .zip(ids)
        .map(|(row, topic_id)| {
            let s = sentiment.classify(&row.remarks)?;
            Ok(FeedbackRecord {
                timestamp: row.timestamp,
                remark_text: row.remarks.clone(),
                topic_id,
                topic_group: topics.resolve(topic_id, &row.remarks).to_string(),
                sentiment_label: s.label,
                sentiment_score: s.score,
                session: row.session.clone(),
            })
        })
        .collect()
}

/// Load and, for today's responses, classify the records dated `date`.
pub async fn analyze(state: &AppState, date: NaiveDate) -> Result<Analysis, AnalyzeError> {
    let today = state.today.date();
    match state.source.load(date, today).await? {
        Loaded::Historical(records) => Ok(Analysis {
            mode: Mode::Historical,
            records,
        }),
        Loaded::Live(rows) if rows.is_empty() => Ok(Analysis {
            mode: Mode::Live,
            records: vec![],
        }),
        Loaded::Live(rows) => {
            let topics = state.topics.clone();
            let topic_model = state.topic_model.clone();
            let sentiment = state.sentiment.clone();
            let records = tokio::task::spawn_blocking(move || {
                classify_responses(&rows, &topics, topic_model.as_ref(), sentiment.as_ref())
            })
            .await
            .map_err(|e| AnalyzeError::Task(e.to_string()))?
            .map_err(AnalyzeError::Classifier)?;

            info!(
                %date,
                records = records.len(),
                topic_model = state.topic_model.name(),
                sentiment = state.sentiment.name(),
                "classified live responses"
            );
            Ok(Analysis {
                mode: Mode::Live,
                records,
            })
        }
    }
}
