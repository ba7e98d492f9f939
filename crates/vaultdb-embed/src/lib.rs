//! Embedding backends for the retrieval core.
//!
//! One backend instance is built at startup via [`build_embedder`] and held
//! for the process lifetime. Both backends are deterministic for a fixed
//! model and input, and run without network access.

mod device;
mod hashed;
mod local;
mod pool;
mod tokenize;

pub use device::select_device;
pub use hashed::HashedEmbedder;
pub use local::LocalEmbedder;
pub use pool::masked_mean_l2;

use vaultdb_core::config::{EmbedderKind, VaultConfig};
use vaultdb_core::error::{Error, Result};
use vaultdb_core::traits::Embedder;

/// Resolve the configured embedding backend.
///
/// Keyed on [`EmbedderKind`]; called exactly once when a vault is opened.
pub fn build_embedder(cfg: &VaultConfig) -> Result<Box<dyn Embedder>> {
    match cfg.embedder {
        EmbedderKind::Hashed => {
            Ok(Box::new(HashedEmbedder::new(cfg.hashed_dim, cfg.truncation)))
        }
        EmbedderKind::Local => {
            let dir = cfg.model_dir.as_deref().ok_or_else(|| {
                Error::InvalidConfig("embedder = local requires model_dir".to_string())
            })?;
            Ok(Box::new(LocalEmbedder::load(dir, cfg.truncation)?))
        }
    }
}
