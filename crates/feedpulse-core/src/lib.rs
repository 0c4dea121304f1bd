//! Core feedback types, topic resolution, aggregation, and the flat-file schema.

pub mod aggregate;
mod error;
pub mod record;
pub mod schema;
pub mod topics;

pub use aggregate::{
    ChartSeries, OverallLabel, OverallSentiment, TopicSummary, chart_series, overall_by_topic,
    summarize_historical, summarize_live,
};
pub use error::CoreError;
pub use record::{FeedbackRecord, ResponseRow, SentimentLabel, parse_date, parse_timestamp};
pub use topics::{TopicGroup, TopicGroups};
