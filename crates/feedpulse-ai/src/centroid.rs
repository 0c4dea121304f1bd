//! Nearest-centroid topic assignment.
//!
//! Each topic of the pretrained topic model is represented by one embedding
//! (its centroid), exported alongside the model as `topics.json`:
//!
//! ```json
//! { "topics": [ { "id": 0, "centroid": [0.01, -0.2, ...] }, ... ] }
//! ```
//!
//! A remark embedding is assigned the topic with the highest cosine
//! similarity, or no topic when the best similarity is below the configured
//! floor. Negative ids (the topic model's outlier bucket) are not assignable.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

/// One topic and its centroid embedding.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicCentroid {
    pub id: i64,
    pub centroid: Vec<f32>,
}

#[derive(Deserialize)]
struct CentroidFile {
    topics: Vec<TopicCentroid>,
}

/// L2-normalized topic centroids with a similarity floor.
pub struct TopicCentroids {
    ids: Vec<i64>,
    centroids: Vec<Vec<f32>>,
    dim: usize,
    min_similarity: f32,
}

impl TopicCentroids {
    /// Build from raw centroids. Outlier topics (negative ids) are dropped.
    pub fn new(topics: Vec<TopicCentroid>, min_similarity: f32) -> anyhow::Result<Self> {
        let mut ids = Vec::with_capacity(topics.len());
        let mut centroids = Vec::with_capacity(topics.len());
        let mut dim = None;

        for topic in topics {
            if topic.id < 0 {
                continue;
            }
            let expected = *dim.get_or_insert(topic.centroid.len());
            anyhow::ensure!(
                topic.centroid.len() == expected,
                "topic {} has dimension {}, expected {expected}",
                topic.id,
                topic.centroid.len()
            );
            let mut centroid = topic.centroid;
            normalize(&mut centroid);
            ids.push(topic.id);
            centroids.push(centroid);
        }

        let dim = dim.ok_or_else(|| anyhow::anyhow!("no assignable topics"))?;
        anyhow::ensure!(dim > 0, "topic centroids are empty vectors");

        Ok(Self {
            ids,
            centroids,
            dim,
            min_similarity,
        })
    }

    /// Load `{ "topics": [...] }` from a JSON file.
    pub fn from_json_file(path: &Path, min_similarity: f32) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading topic centroids {}", path.display()))?;
        let file: CentroidFile = serde_json::from_str(&text)
            .with_context(|| format!("parsing topic centroids {}", path.display()))?;
        let centroids = Self::new(file.topics, min_similarity)?;
        info!(
            topics = centroids.len(),
            dim = centroids.dim,
            path = %path.display(),
            "loaded topic centroids"
        );
        Ok(centroids)
    }

    /// Topic with the highest cosine similarity, regardless of the floor.
    pub fn best_match(&self, embedding: &[f32]) -> Option<(i64, f32)> {
        if embedding.len() != self.dim {
            return None;
        }
        let norm = l2(embedding);
        if norm == 0.0 {
            return None;
        }

        let mut best: Option<(i64, f32)> = None;
        for (&id, centroid) in self.ids.iter().zip(&self.centroids) {
            let sim = cosine_sim(embedding, centroid) / norm;
            if best.is_none_or(|(_, b)| sim > b) {
                best = Some((id, sim));
            }
        }
        best
    }

    /// Assigned topic id, or `None` below the similarity floor.
    pub fn assign(&self, embedding: &[f32]) -> Option<i64> {
        self.best_match(embedding)
            .filter(|&(_, sim)| sim >= self.min_similarity)
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Embedding dimensionality the centroids were computed in.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn min_similarity(&self) -> f32 {
        self.min_similarity
    }
}

fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn l2(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// L2-normalize a vector in place.
fn normalize(v: &mut [f32]) {
    let norm = l2(v);
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
