use std::sync::Arc;

use chrono::NaiveDate;
use feedpulse_ai::{SentimentClassifier, TopicClassifier};
use feedpulse_core::TopicGroups;
use feedpulse_store::DataSource;

/// What "today" means when choosing between the live and historical source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Today {
    /// The server's local calendar date.
    #[default]
    Local,
    Fixed(NaiveDate),
}

impl Today {
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Local => chrono::Local::now().date_naive(),
            Self::Fixed(date) => *date,
        }
    }
}

/// Process-wide resources, built once at startup and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub source: DataSource,
    pub topics: Arc<TopicGroups>,
    pub topic_model: Arc<dyn TopicClassifier>,
    pub sentiment: Arc<dyn SentimentClassifier>,
    pub today: Today,
}

impl AppState {
    pub fn new(
        source: DataSource,
        topics: TopicGroups,
        topic_model: Arc<dyn TopicClassifier>,
        sentiment: Arc<dyn SentimentClassifier>,
    ) -> Self {
        Self {
            source,
            topics: Arc::new(topics),
            topic_model,
            sentiment,
            today: Today::Local,
        }
    }

    pub fn with_today(mut self, today: Today) -> Self {
        self.today = today;
        self
    }
}
