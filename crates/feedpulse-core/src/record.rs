//! Feedback records, sentiment labels, and timestamp parsing.
//!
//! A [`ResponseRow`] is a raw live form response; a [`FeedbackRecord`] is a
//! response after topic and sentiment classification (or a row read back from
//! the historical dataset, which is stored pre-classified).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Scores inside `(-NEUTRAL_BAND, NEUTRAL_BAND)` count as neutral.
pub const NEUTRAL_BAND: f64 = 0.05;

/// Categorical sentiment of a single remark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }

    /// Label a continuous polarity score using the [`NEUTRAL_BAND`] thresholds.
    pub fn from_score(score: f64) -> Self {
        if score > NEUTRAL_BAND {
            Self::Positive
        } else if score < -NEUTRAL_BAND {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" | "pos" => Ok(Self::Positive),
            "neutral" | "neu" => Ok(Self::Neutral),
            "negative" | "neg" => Ok(Self::Negative),
            _ => Err(CoreError::UnknownSentiment(s.to_string())),
        }
    }
}

/// A raw live response as fetched from the form spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRow {
    pub timestamp: NaiveDateTime,
    /// Free-text answer the topic model runs on (`Question 11`).
    pub topic_text: String,
    /// Remark the sentiment model and the empty-comment heuristic run on (`REMARKS`).
    pub remarks: String,
    pub session: Option<String>,
}

impl ResponseRow {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// A classified feedback response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRecord {
    pub timestamp: NaiveDateTime,
    pub remark_text: String,
    pub topic_id: Option<i64>,
    pub topic_group: String,
    pub sentiment_label: SentimentLabel,
    pub sentiment_score: Option<f64>,
    pub session: Option<String>,
}

impl FeedbackRecord {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

// Slash dates are tried month-first, as in US-locale Google Forms exports,
// then day-first for sheets in other locales (19/10/2026).
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];

/// Parse a spreadsheet or flat-file timestamp cell.
///
/// Accepts RFC 3339 (offset dropped, wall-clock kept), ISO-like date-times,
/// `M/D/YYYY` date-times with a `D/M/YYYY` fallback when the month-first
/// reading is impossible, and bare dates (midnight).
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, CoreError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d.and_time(NaiveTime::MIN));
        }
    }
    Err(CoreError::InvalidTimestamp(s.to_string()))
}

/// Parse a date (any format [`parse_timestamp`] accepts; the time part is dropped).
pub fn parse_date(s: &str) -> Result<NaiveDate, CoreError> {
    parse_timestamp(s).map(|dt| dt.date())
}
