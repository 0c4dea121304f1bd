//! Pretrained topic model: sentence embedder plus exported topic centroids.
//!
//! The model directory holds `model.onnx`, `tokenizer.json` and `topics.json`.

use std::path::Path;
use std::sync::Mutex;

use tracing::debug;

use crate::centroid::TopicCentroids;
use crate::classify::TopicClassifier;
use crate::embedder::Embedder;

const EMBED_CHUNK: usize = 64;

pub struct EmbeddingTopicModel {
    embedder: Mutex<Embedder>,
    centroids: TopicCentroids,
}

impl EmbeddingTopicModel {
    pub fn load(model_dir: &Path, min_similarity: f32) -> anyhow::Result<Self> {
        let embedder = Embedder::load(model_dir)?;
        let centroids =
            TopicCentroids::from_json_file(&model_dir.join("topics.json"), min_similarity)?;
        Self::new(embedder, centroids)
    }

    pub fn new(embedder: Embedder, centroids: TopicCentroids) -> anyhow::Result<Self> {
        anyhow::ensure!(
            embedder.dim() == centroids.dim(),
            "embedding dimension {} does not match topic centroids ({})",
            embedder.dim(),
            centroids.dim()
        );
        Ok(Self {
            embedder: Mutex::new(embedder),
            centroids,
        })
    }

    pub fn topic_count(&self) -> usize {
        self.centroids.len()
    }
}

impl TopicClassifier for EmbeddingTopicModel {
    fn classify_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Option<i64>>> {
        let mut embedder = self
            .embedder
            .lock()
            .map_err(|_| anyhow::anyhow!("topic embedder lock poisoned"))?;

        let mut ids = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(EMBED_CHUNK) {
            for embedding in embedder.embed_batch(chunk)? {
                ids.push(self.centroids.assign(&embedding));
            }
        }
        debug!(
            texts = texts.len(),
            assigned = ids.iter().filter(|id| id.is_some()).count(),
            "topic batch classified"
        );
        Ok(ids)
    }

    fn name(&self) -> &str {
        "embedding-topics"
    }
}
