//! Sequence-classification sentiment model (e.g. a fine-tuned RoBERTa
//! exported to ONNX). Logits are softmaxed; the label comes from the
//! `id2label` table in the export's `config.json`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use feedpulse_core::SentimentLabel;
use ort::session::Session;
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::info;

use crate::classify::{Sentiment, SentimentClassifier};
use crate::encode::{EncodedBatch, ModelFiles, load_tokenizer, takes_token_types};

const MAX_TOKENS: usize = 512;

#[derive(Deserialize)]
struct ModelConfig {
    id2label: BTreeMap<String, String>,
}

pub struct OnnxSentiment {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    token_types: bool,
    /// Label of each logit, indexed by class id.
    labels: Vec<SentimentLabel>,
}

impl OnnxSentiment {
    /// Load from a directory with `model.onnx`, `tokenizer.json` and `config.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let files = ModelFiles::locate(model_dir)?;
        let config_path = model_dir.join("config.json");
        let text = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: ModelConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", config_path.display()))?;
        let labels = labels_from_config(&config.id2label)?;

        let session = Session::builder()?.commit_from_file(&files.model)?;
        let token_types = takes_token_types(&session);
        let tokenizer = load_tokenizer(&files.tokenizer, MAX_TOKENS)?;

        info!(classes = labels.len(), model = %files.model.display(), "loaded sentiment model");
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            token_types,
            labels,
        })
    }

    fn logits(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let batch = EncodedBatch::encode(&self.tokenizer, &[text])?;
        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("sentiment session lock poisoned"))?;
        let (dims, data) = batch.run(&mut session, self.token_types)?;
        anyhow::ensure!(
            dims == [1, self.labels.len() as i64],
            "unexpected logits shape {dims:?}, expected [1, {}]",
            self.labels.len()
        );
        Ok(data)
    }
}

impl SentimentClassifier for OnnxSentiment {
    fn classify(&self, text: &str) -> anyhow::Result<Sentiment> {
        let probs = softmax(&self.logits(text)?);
        Ok(sentiment_from_probs(&self.labels, &probs))
    }

    fn name(&self) -> &str {
        "onnx-sentiment"
    }
}

/// Map a model label name such as `LABEL_POSITIVE`, `pos` or `Neutral`.
fn label_from_name(name: &str) -> Option<SentimentLabel> {
    let name = name.to_lowercase();
    if name.contains("pos") {
        Some(SentimentLabel::Positive)
    } else if name.contains("neg") {
        Some(SentimentLabel::Negative)
    } else if name.contains("neu") {
        Some(SentimentLabel::Neutral)
    } else {
        None
    }
}

/// Class ids must be dense `0..n`.
fn labels_from_config(id2label: &BTreeMap<String, String>) -> anyhow::Result<Vec<SentimentLabel>> {
    let mut by_id = BTreeMap::new();
    for (id, name) in id2label {
        let id: usize = id
            .parse()
            .with_context(|| format!("id2label key {id:?} is not a class index"))?;
        let label = label_from_name(name)
            .ok_or_else(|| anyhow::anyhow!("unrecognised sentiment label {name:?}"))?;
        by_id.insert(id, label);
    }
    anyhow::ensure!(!by_id.is_empty(), "id2label is empty");
    anyhow::ensure!(
        by_id.keys().copied().eq(0..by_id.len()),
        "id2label ids are not contiguous: {:?}",
        by_id.keys().collect::<Vec<_>>()
    );
    Ok(by_id.into_values().collect())
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

/// Argmax picks the label; the score is `p(positive) - p(negative)`.
fn sentiment_from_probs(labels: &[SentimentLabel], probs: &[f32]) -> Sentiment {
    let mut best = 0;
    let mut positive = 0.0;
    let mut negative = 0.0;
    for (i, (&label, &p)) in labels.iter().zip(probs).enumerate() {
        if p > probs[best] {
            best = i;
        }
        match label {
            SentimentLabel::Positive => positive += p as f64,
            SentimentLabel::Negative => negative += p as f64,
            SentimentLabel::Neutral => {}
        }
    }
    Sentiment {
        label: labels[best],
        score: Some(positive - negative),
    }
}
