//! Classifier seams consumed by the analysis pipeline.
//!
//! Implementations are built once at startup and shared across requests, so
//! both traits take `&self` and require `Send + Sync`. Models that need
//! exclusive access to an inference session keep it behind a lock.

use feedpulse_core::SentimentLabel;

/// Sentiment of one remark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sentiment {
    pub label: SentimentLabel,
    /// Continuous polarity in `[-1, 1]`, when the model produces one.
    pub score: Option<f64>,
}

impl Sentiment {
    /// Derive the label from a polarity score.
    pub fn from_score(score: f64) -> Self {
        Self {
            label: SentimentLabel::from_score(score),
            score: Some(score),
        }
    }
}

/// Maps remark texts to topic ids.
pub trait TopicClassifier: Send + Sync {
    /// One entry per input text; `None` means no confident topic.
    fn classify_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Option<i64>>>;

    fn name(&self) -> &str;
}

/// Scores the sentiment of a single remark.
pub trait SentimentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> anyhow::Result<Sentiment>;

    fn name(&self) -> &str;
}

/// Topic classifier that assigns no topic. Every remark falls through to the
/// empty-comment heuristic of the topic resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnassignedTopics;

impl TopicClassifier for UnassignedTopics {
    fn classify_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Option<i64>>> {
        Ok(vec![None; texts.len()])
    }

    fn name(&self) -> &str {
        "unassigned"
    }
}
