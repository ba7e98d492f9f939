//! Configuration surface for the retrieval core.
//!
//! Uses Figment to merge `vault.toml` + `VAULT_*` env vars into a typed
//! config. Provides helpers to expand `~` and `${VAR}` and to resolve
//! relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Similarity metric used by the vector index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cosine,
    Euclidean,
}

/// Internal index structure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Flat,
    Ivf,
}

/// Embedding backend, resolved once at startup by the embed factory.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    Local,
    Hashed,
}

/// What to do with inputs longer than the model's maximum length.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TruncationPolicy {
    Truncate,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub data_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub metric: Metric,
    pub index: IndexKind,
    pub embedder: EmbedderKind,
    /// Directory holding tokenizer.json + config.json + weights for the
    /// local model. Required when `embedder = local`.
    pub model_dir: Option<PathBuf>,
    /// Dimensionality of the hashed backend.
    pub hashed_dim: usize,
    pub truncation: TruncationPolicy,
    /// Gates ingestion adapters that need network access; never consulted by
    /// the core's own operations.
    pub offline: bool,
    /// Candidate over-fetch factor applied before query-time filtering.
    pub overfetch: usize,
    /// At most this many chunks per document in one result set.
    pub max_per_doc: Option<usize>,
    /// Candidates scoring below this are dropped even if fewer than `k`
    /// results remain.
    pub min_score: Option<f32>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            chunk_size: 800,
            chunk_overlap: 80,
            metric: Metric::Cosine,
            index: IndexKind::Flat,
            embedder: EmbedderKind::Hashed,
            model_dir: None,
            hashed_dim: 384,
            truncation: TruncationPolicy::Truncate,
            offline: true,
            overfetch: 4,
            max_per_doc: None,
            min_score: None,
        }
    }
}

impl VaultConfig {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("vault.toml"))
            .merge(Env::prefixed("VAULT_"));
        let cfg: Self = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        tracing::debug!(?cfg.data_dir, ?cfg.metric, ?cfg.index, "configuration loaded");
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap {} must be smaller than chunk_size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.overfetch == 0 {
            return Err(Error::InvalidConfig("overfetch must be positive".to_string()));
        }
        if self.hashed_dim == 0 {
            return Err(Error::InvalidConfig("hashed_dim must be positive".to_string()));
        }
        if self.max_per_doc == Some(0) {
            return Err(Error::InvalidConfig("max_per_doc must be positive when set".to_string()));
        }
        if self.embedder == EmbedderKind::Local && self.model_dir.is_none() {
            return Err(Error::InvalidConfig(
                "embedder = local requires model_dir".to_string(),
            ));
        }
        Ok(())
    }

    /// Location of the active snapshot under `data_dir`.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("vault.snapshot")
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after
/// expansion. If `p` is absolute, it's returned as-is.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
