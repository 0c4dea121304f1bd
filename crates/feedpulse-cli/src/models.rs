//! Startup loading of topic groups and classifiers.
//!
//! Each model is optional. Without a topic model every remark goes through the
//! empty-comment fallback; without a sentiment model the lexicon scorer is used.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use feedpulse_ai::{LexiconSentiment, SentimentClassifier, TopicClassifier, UnassignedTopics};
use feedpulse_core::TopicGroups;
use tracing::{info, warn};

#[derive(Args, Debug, Clone, Default)]
pub struct TopicMapArgs {
    /// JSON file of topic groups (`[{"name": ..., "ids": [...]}]`); built-in table when absent
    #[arg(long = "topic-map", env = "FEEDPULSE_TOPIC_MAP")]
    pub path: Option<PathBuf>,
}

impl TopicMapArgs {
    pub fn load(&self) -> anyhow::Result<TopicGroups> {
        load_topic_groups(self.path.as_deref())
    }
}

#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    #[command(flatten)]
    pub topic_map: TopicMapArgs,

    /// Directory with model.onnx, tokenizer.json and topics.json
    #[arg(long, env = "FEEDPULSE_TOPIC_MODEL")]
    pub topic_model: Option<PathBuf>,

    /// Directory with model.onnx, tokenizer.json and config.json
    #[arg(long, env = "FEEDPULSE_SENTIMENT_MODEL")]
    pub sentiment_model: Option<PathBuf>,

    /// Cosine similarity below which a remark gets no topic
    #[arg(long, env = "FEEDPULSE_MIN_TOPIC_SIMILARITY", default_value_t = 0.3)]
    pub min_topic_similarity: f32,
}

pub struct Classifiers {
    pub topics: TopicGroups,
    pub topic_model: Arc<dyn TopicClassifier>,
    pub sentiment: Arc<dyn SentimentClassifier>,
}

impl Classifiers {
    pub fn load(args: &ModelArgs) -> anyhow::Result<Self> {
        let topics = args.topic_map.load()?;
        let topic_model = load_topic_model(args.topic_model.as_deref(), args.min_topic_similarity)?;
        let sentiment = load_sentiment(args.sentiment_model.as_deref())?;
        info!(
            groups = topics.len(),
            topic_model = topic_model.name(),
            sentiment = sentiment.name(),
            "classifiers ready"
        );
        Ok(Self {
            topics,
            topic_model,
            sentiment,
        })
    }
}

/// Topic groups from `path`, or the built-in table. Ids listed under more
/// than one group are reported; they resolve to the first group.
fn load_topic_groups(path: Option<&Path>) -> anyhow::Result<TopicGroups> {
    let topics = match path {
        Some(path) => TopicGroups::from_json_file(path)?,
        None => TopicGroups::builtin(),
    };
    for (id, groups) in topics.overlaps() {
        warn!(id, groups = ?groups, "topic id listed in several groups; the first one wins");
    }
    Ok(topics)
}

fn load_topic_model(
    dir: Option<&Path>,
    min_similarity: f32,
) -> anyhow::Result<Arc<dyn TopicClassifier>> {
    let Some(dir) = dir else {
        info!("no topic model configured; using the empty-comment fallback only");
        return Ok(Arc::new(UnassignedTopics));
    };
    onnx_topic_model(dir, min_similarity)
}

fn load_sentiment(dir: Option<&Path>) -> anyhow::Result<Arc<dyn SentimentClassifier>> {
    let Some(dir) = dir else {
        info!("no sentiment model configured; using the lexicon scorer");
        return Ok(Arc::new(LexiconSentiment::default()));
    };
    onnx_sentiment(dir)
}

#[cfg(feature = "onnx")]
fn onnx_topic_model(dir: &Path, min_similarity: f32) -> anyhow::Result<Arc<dyn TopicClassifier>> {
    Ok(Arc::new(feedpulse_ai::EmbeddingTopicModel::load(dir, min_similarity)?))
}

#[cfg(not(feature = "onnx"))]
fn onnx_topic_model(dir: &Path, _min_similarity: f32) -> anyhow::Result<Arc<dyn TopicClassifier>> {
    anyhow::bail!(
        "topic model {} requires feedpulse built with the `onnx` feature",
        dir.display()
    )
}

#[cfg(feature = "onnx")]
fn onnx_sentiment(dir: &Path) -> anyhow::Result<Arc<dyn SentimentClassifier>> {
    Ok(Arc::new(feedpulse_ai::OnnxSentiment::load(dir)?))
}

#[cfg(not(feature = "onnx"))]
fn onnx_sentiment(dir: &Path) -> anyhow::Result<Arc<dyn SentimentClassifier>> {
    anyhow::bail!(
        "sentiment model {} requires feedpulse built with the `onnx` feature",
        dir.display()
    )
}
