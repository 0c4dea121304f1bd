//! Classifier layer: the topic/sentiment seams, a lexicon sentiment scorer,
//! nearest-centroid topic assignment, and ONNX Runtime models.

mod centroid;
mod classify;
mod lexicon;

pub use centroid::{TopicCentroid, TopicCentroids};
pub use classify::{Sentiment, SentimentClassifier, TopicClassifier, UnassignedTopics};
pub use lexicon::LexiconSentiment;

#[cfg(feature = "onnx")]
mod embedder;
#[cfg(feature = "onnx")]
mod encode;
#[cfg(feature = "onnx")]
mod sentiment_model;
#[cfg(feature = "onnx")]
mod topic_model;
#[cfg(feature = "onnx")]
pub use embedder::Embedder;
#[cfg(feature = "onnx")]
pub use sentiment_model::OnnxSentiment;
#[cfg(feature = "onnx")]
pub use topic_model::EmbeddingTopicModel;
