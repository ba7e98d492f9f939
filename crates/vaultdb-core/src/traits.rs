use crate::error::Result;
use crate::types::Document;

/// Maps text to fixed-dimensional vectors.
///
/// One instance is created at startup and lives for the process lifetime;
/// implementations hold their model in memory and never reload per call.
/// `embed_batch` preserves input order and length, and batching must not
/// change per-item results versus single-item calls.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the backend/model (e.g. `hashed:d384`).
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    /// Maximum supported input length, in the backend's own units.
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Capability interface for ingestion adapters: one operation, "produce
/// documents". The core only ever sees the text-and-metadata shape.
pub trait DocumentProducer: Send + Sync {
    /// Whether producing documents requires network access. Checked against
    /// the offline flag before `produce` is called.
    fn requires_network(&self) -> bool {
        false
    }
    fn produce(&self) -> Result<Vec<Document>>;
}
