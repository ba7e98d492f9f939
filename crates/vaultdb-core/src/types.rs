//! Domain types shared by the store, index and query engines.

use chrono::Utc;
use serde::{Deserialize, Serialize};

pub type DocId = String;
pub type ChunkId = String;

/// Where a document's text originally came from.
///
/// The core never fetches anything itself; the kind is carried as metadata so
/// queries can filter on it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Web,
    Pdf,
    Note,
    Trend,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMeta {
    pub title: String,
    pub origin: String,
    /// UTC milliseconds at ingestion time.
    pub ingested_at: i64,
}

/// A unit of ingestion: plain text plus metadata, produced by an adapter.
///
/// Immutable once ingested; re-ingesting under the same `id` replaces the
/// document and everything derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub source: SourceKind,
    pub text: String,
    pub meta: DocumentMeta,
}

impl Document {
    pub fn new(id: DocId, source: SourceKind, text: String, title: String, origin: String) -> Self {
        Self {
            id,
            source,
            text,
            meta: DocumentMeta { title, origin, ingested_at: Utc::now().timestamp_millis() },
        }
    }

    /// Stable identifier derived from the document text for callers that do
    /// not bring their own.
    pub fn content_id(text: &str) -> DocId {
        let hex = blake3::hash(text.as_bytes()).to_hex();
        hex.as_str()[..16].to_string()
    }
}

/// A bounded span of a document used as the unit of retrieval.
///
/// `start`/`end` are character offsets into the owning document's text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub id: ChunkId,
    pub doc_id: DocId,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Raw nearest-neighbor hit returned by the vector index.
///
/// `score` is metric-dependent but higher is always closer.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub chunk_id: ChunkId,
    pub score: f32,
}

/// Fully resolved query result handed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub chunk_id: ChunkId,
    pub doc_id: DocId,
    pub score: f32,
    pub title: String,
    pub text: String,
}

/// Vector index lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexState {
    Empty,
    Building,
    Ready,
    Rebuilding,
    Failed,
}

/// Counters surfaced by `status()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultStatus {
    pub state: IndexState,
    pub documents: usize,
    pub chunks: usize,
    pub dim: usize,
}
