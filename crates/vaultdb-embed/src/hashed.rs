//! Deterministic hash-based embedding backend.
//!
//! Whitespace tokens are hashed into a fixed number of buckets with a
//! position-dependent perturbation and the bucket vector is L2-normalized.
//! Not semantically meaningful, but cheap, fully offline and deterministic;
//! this is the backend used when no local model directory is provisioned,
//! and the one tests run against.

use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use vaultdb_core::config::TruncationPolicy;
use vaultdb_core::error::{Error, Result};
use vaultdb_core::traits::Embedder;

const MAX_TOKENS: usize = 8192;

pub struct HashedEmbedder {
    dim: usize,
    max_len: usize,
    truncation: TruncationPolicy,
    id: String,
}

impl HashedEmbedder {
    pub fn new(dim: usize, truncation: TruncationPolicy) -> Self {
        Self::with_max_len(dim, truncation, MAX_TOKENS)
    }

    /// Same backend with a custom token limit. Used to exercise the
    /// truncation policy without a huge input.
    pub fn with_max_len(dim: usize, truncation: TruncationPolicy, max_len: usize) -> Self {
        Self { dim, max_len, truncation, id: format!("hashed:d{dim}") }
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let tokens = if tokens.len() > self.max_len {
            match self.truncation {
                TruncationPolicy::Error => {
                    return Err(Error::Embedding(format!(
                        "input of {} tokens exceeds maximum length {}",
                        tokens.len(),
                        self.max_len
                    )))
                }
                TruncationPolicy::Truncate => &tokens[..self.max_len],
            }
        } else {
            &tokens[..]
        };
        let mut v = vec![0f32; self.dim];
        for (i, token) in tokens.iter().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        Ok(v)
    }
}

impl Embedder for HashedEmbedder {
    fn id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        self.max_len
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_one(t)).collect()
    }
}
