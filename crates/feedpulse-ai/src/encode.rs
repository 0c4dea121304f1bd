//! Tokenization shared by the ONNX models.
//!
//! Both model directories follow the Hugging Face export layout: `model.onnx`
//! next to `tokenizer.json`.

use std::path::{Path, PathBuf};

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

/// Paths of a model directory, checked to exist.
pub(crate) struct ModelFiles {
    pub model: PathBuf,
    pub tokenizer: PathBuf,
}

impl ModelFiles {
    pub fn locate(model_dir: &Path) -> anyhow::Result<Self> {
        let model = model_dir.join("model.onnx");
        let tokenizer = model_dir.join("tokenizer.json");
        anyhow::ensure!(model.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(tokenizer.exists(), "tokenizer.json not found in {model_dir:?}");
        Ok(Self { model, tokenizer })
    }
}

/// Load a tokenizer that truncates to `max_length` and pads a batch to its longest entry.
pub(crate) fn load_tokenizer(path: &Path, max_length: usize) -> anyhow::Result<Tokenizer> {
    let mut tokenizer =
        Tokenizer::from_file(path).map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
    tokenizer
        .with_truncation(Some(tokenizers::TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
    tokenizer.with_padding(Some(tokenizers::PaddingParams {
        ..Default::default()
    }));
    Ok(tokenizer)
}

/// Whether the session declares a `token_type_ids` input (BERT does, DistilBERT and RoBERTa don't).
pub(crate) fn takes_token_types(session: &Session) -> bool {
    session
        .inputs()
        .iter()
        .any(|input| input.name() == "token_type_ids")
}

/// A tokenized batch laid out as flat `[batch_size, seq_len]` buffers.
pub(crate) struct EncodedBatch {
    pub batch_size: usize,
    pub seq_len: usize,
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl EncodedBatch {
    pub fn encode(tokenizer: &Tokenizer, texts: &[&str]) -> anyhow::Result<Self> {
        let encodings = tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let batch_size = encodings.len();
        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut batch = Self {
            batch_size,
            seq_len,
            input_ids: vec![0; batch_size * seq_len],
            attention_mask: vec![0; batch_size * seq_len],
            token_type_ids: vec![0; batch_size * seq_len],
        };

        for (i, encoding) in encodings.iter().enumerate() {
            let offset = i * seq_len;
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();
            for j in 0..ids.len() {
                batch.input_ids[offset + j] = ids[j] as i64;
                batch.attention_mask[offset + j] = mask[j] as i64;
                batch.token_type_ids[offset + j] = types[j] as i64;
            }
        }

        Ok(batch)
    }

    fn shape(&self) -> [i64; 2] {
        [self.batch_size as i64, self.seq_len as i64]
    }

    /// Run the session on this batch and copy out the first output as
    /// `(dims, values)`. `token_type_ids` is only fed when the model declares it.
    pub fn run(
        &self,
        session: &mut Session,
        with_token_types: bool,
    ) -> anyhow::Result<(Vec<i64>, Vec<f32>)> {
        let shape = self.shape();
        let ids = Tensor::from_array((shape, self.input_ids.clone().into_boxed_slice()))?;
        let mask = Tensor::from_array((shape, self.attention_mask.clone().into_boxed_slice()))?;

        let outputs = if with_token_types {
            let types =
                Tensor::from_array((shape, self.token_type_ids.clone().into_boxed_slice()))?;
            session.run(ort::inputs![
                "input_ids" => ids,
                "attention_mask" => mask,
                "token_type_ids" => types,
            ])?
        } else {
            session.run(ort::inputs![
                "input_ids" => ids,
                "attention_mask" => mask,
            ])?
        };

        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        Ok((dims.to_vec(), output_data.to_vec()))
    }
}
