//! Sentence embeddings for feedback remarks via ONNX Runtime.
//!
//! Mean-pools token embeddings under the attention mask and L2-normalizes the
//! result, the way sentence-transformers models (e.g. all-MiniLM-L6-v2) are
//! meant to be read. The topic model's centroids must come from the same model.

use std::path::Path;

use ort::session::Session;
use tokenizers::Tokenizer;
use tracing::info;

use crate::encode::{EncodedBatch, ModelFiles, load_tokenizer, takes_token_types};

/// Remarks are short; 256 word pieces covers a long paragraph.
const MAX_TOKENS: usize = 256;

/// Sentence embedding generator.
pub struct Embedder {
    session: Session,
    tokenizer: Tokenizer,
    token_types: bool,
    dim: usize,
}

impl Embedder {
    /// Load from a directory containing `model.onnx` and `tokenizer.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let files = ModelFiles::locate(model_dir)?;
        let session = Session::builder()?.commit_from_file(&files.model)?;
        let dim = infer_dim(session.outputs()[0].dtype())
            .ok_or_else(|| anyhow::anyhow!("cannot infer embedding dimension of {model_dir:?}"))?;
        let token_types = takes_token_types(&session);
        let tokenizer = load_tokenizer(&files.tokenizer, MAX_TOKENS)?;

        info!(dim, model = %files.model.display(), "loaded embedding model");
        Ok(Self {
            session,
            tokenizer,
            token_types,
            dim,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embed a batch of texts, one unit-length vector per input.
    pub fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch = EncodedBatch::encode(&self.tokenizer, texts)?;
        let (dims, data) = batch.run(&mut self.session, self.token_types)?;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] as usize == batch.batch_size && dims[2] as usize == self.dim,
            "unexpected output shape: {dims:?}, expected [{}, {}, {}]",
            batch.batch_size,
            batch.seq_len,
            self.dim
        );
        let out_len = dims[1] as usize;

        Ok((0..batch.batch_size)
            .map(|i| {
                let mask = &batch.attention_mask[i * batch.seq_len..(i + 1) * batch.seq_len];
                let tokens = &data[i * out_len * self.dim..(i + 1) * out_len * self.dim];
                mean_pool(tokens, mask, self.dim)
            })
            .collect())
    }
}

/// Masked mean over `[seq_len, dim]` token vectors, then L2-normalized.
fn mean_pool(tokens: &[f32], mask: &[i64], dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut count = 0.0f32;

    for (token, &m) in tokens.chunks_exact(dim).zip(mask) {
        if m > 0 {
            for (p, &v) in pooled.iter_mut().zip(token) {
                *p += v;
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        for p in &mut pooled {
            *p /= count;
        }
    }
    let norm: f32 = pooled.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for p in &mut pooled {
            *p /= norm;
        }
    }
    pooled
}

/// Last dimension of the model's output type, when static.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn model_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("models")
            .join("topic")
    }

    #[test]
    fn mean_pool_ignores_padding() {
        // Two real tokens and one padding token, dim 2.
        let tokens = [1.0, 0.0, 0.0, 1.0, 9.0, 9.0];
        let pooled = mean_pool(&tokens, &[1, 1, 0], 2);
        assert!((pooled[0] - pooled[1]).abs() < 1e-6);
        let norm: f32 = pooled.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mean_pool_all_masked_is_zero() {
        let pooled = mean_pool(&[1.0, 2.0], &[0], 2);
        assert_eq!(pooled, vec![0.0, 0.0]);
    }

    #[test]
    #[ignore = "needs an exported sentence-transformers model in models/topic"]
    fn embeds_unit_vectors() {
        let mut embedder = Embedder::load(&model_dir()).unwrap();
        let vecs = embedder
            .embed_batch(&["The wifi kept dropping", "More hands-on labs please"])
            .unwrap();
        assert_eq!(vecs.len(), 2);
        for v in &vecs {
            assert_eq!(v.len(), embedder.dim());
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4, "expected unit norm, got {norm}");
        }
        assert!(embedder.embed_batch(&[]).unwrap().is_empty());
    }
}
