//! Local transformer embedding backend.
//!
//! Loads an XLM-RoBERTa-family encoder from a local directory containing
//! `tokenizer.json`, `config.json` and `pytorch_model.bin`. Inference is
//! masked-mean pooling over the final hidden states followed by L2
//! normalization. Everything is read from disk once at startup.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XlmRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use vaultdb_core::config::TruncationPolicy;
use vaultdb_core::error::{Error, Result};
use vaultdb_core::traits::Embedder;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::encode_padded;

// Fixed padded window; inputs longer than this hit the truncation policy.
const MAX_LEN: usize = 256;

pub struct LocalEmbedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    truncation: TruncationPolicy,
    id: String,
}

impl LocalEmbedder {
    /// Load tokenizer, config and weights from `model_dir`. Called once; the
    /// instance owns the model for the process lifetime.
    pub fn load(model_dir: &Path, truncation: TruncationPolicy) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading local embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            Error::Embedding(format!(
                "failed to load tokenizer from {}: {e}",
                tokenizer_path.display()
            ))
        })?;

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            Error::Embedding(format!("failed to read {}: {e}", config_path.display()))
        })?;
        let config: XlmRobertaConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::Embedding(format!("failed to parse model config: {e}")))?;

        let weights_path = model_dir.join("pytorch_model.bin");
        let weights = candle_core::pickle::read_all(&weights_path).map_err(|e| {
            Error::Embedding(format!(
                "failed to read weights from {}: {e}",
                weights_path.display()
            ))
        })?;
        let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)
            .map_err(|e| Error::Embedding(format!("failed to build model: {e}")))?;

        let dim = config.hidden_size;
        info!(dim, "local embedding model ready");
        Ok(Self {
            model,
            tokenizer,
            device,
            dim,
            truncation,
            id: format!("local:xlm-roberta:d{dim}"),
        })
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let tensor_err = |e: candle_core::Error| Error::Embedding(format!("tensor op failed: {e}"));

        let enc = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::Embedding(format!("tokenization failed: {e}")))?;
        if enc.get_ids().len() > MAX_LEN && self.truncation == TruncationPolicy::Error {
            return Err(Error::Embedding(format!(
                "input of {} tokens exceeds maximum length {MAX_LEN}",
                enc.get_ids().len()
            )));
        }

        let (input_ids, attention_mask) = encode_padded(&enc, MAX_LEN, &self.device)?;
        let token_type_ids =
            Tensor::zeros((1, MAX_LEN), DType::I64, &self.device).map_err(tensor_err)?;
        let hidden = self
            .model
            .forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)
            .map_err(tensor_err)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let out: Vec<f32> = pooled
            .to_device(&Device::Cpu)
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_vec1())
            .map_err(tensor_err)?;

        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "embedded one input");
        Ok(out)
    }
}

impl Embedder for LocalEmbedder {
    fn id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        MAX_LEN
    }

    // One forward pass per item keeps batched output bit-identical to
    // single-item calls regardless of batch composition.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_one(t)).collect()
    }
}
