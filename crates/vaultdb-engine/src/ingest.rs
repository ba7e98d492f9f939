//! Ingestion: chunk, embed and record documents in one logical transaction.

use tracing::{info, warn};

use vaultdb_core::cancel::CancelFlag;
use vaultdb_core::chunker::{chunk, ChunkerConfig};
use vaultdb_core::error::{Error, Result};
use vaultdb_core::traits::DocumentProducer;
use vaultdb_core::types::{ChunkId, DocId, Document};

use crate::Vault;

/// Outcome of a batch ingestion. Per-document failures are isolated: the
/// batch continues and failed documents are reported here.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub ingested: Vec<DocId>,
    pub failed: Vec<(DocId, String)>,
    pub canceled: bool,
}

impl Vault {
    /// Ingest one document: chunk, embed, then record store and index
    /// entries together. Re-ingesting an existing id fully replaces the
    /// previous version. Nothing is recorded if chunking or embedding fails.
    pub fn ingest(&self, doc: Document) -> Result<DocId> {
        if doc.id.is_empty() {
            return Err(Error::Ingest {
                doc_id: String::new(),
                reason: "document id is empty".to_string(),
            });
        }
        let chunker = ChunkerConfig {
            chunk_size: self.cfg.chunk_size,
            overlap: self.cfg.chunk_overlap,
        };
        let chunks = chunk(&doc.id, &doc.text, chunker)?;
        if chunks.is_empty() {
            return Err(Error::Ingest { doc_id: doc.id, reason: "document has no text".to_string() });
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder().embed_batch(&texts)?;
        if embeddings.len() != chunks.len() {
            return Err(Error::Embedding(format!(
                "backend returned {} vectors for {} inputs",
                embeddings.len(),
                chunks.len()
            )));
        }
        for e in &embeddings {
            if e.len() != self.index().dim() {
                return Err(Error::DimensionMismatch {
                    expected: self.index().dim(),
                    actual: e.len(),
                });
            }
        }

        // Store and index move together; the store lock is held across both
        // so no reader sees a document without its index entries retired.
        let doc_id = doc.id.clone();
        let chunk_ids: Vec<ChunkId> = chunks.iter().map(|c| c.id.clone()).collect();
        let mut store = self.store_mut();
        let evicted = store.upsert(doc, chunks);
        for id in &evicted {
            if let Err(e) = self.index().remove(id) {
                warn!(chunk_id = %id, error = %e, "failed to evict replaced chunk");
            }
        }
        for (id, vector) in chunk_ids.iter().zip(embeddings) {
            self.index().add(id, vector)?;
        }
        drop(store);
        self.index().publish();
        info!(doc_id = %doc_id, chunks = chunk_ids.len(), "document ingested");
        Ok(doc_id)
    }

    /// Ingest a batch with per-document failure isolation. Checks the cancel
    /// flag between documents; already-ingested documents stay.
    pub fn ingest_all(&self, docs: Vec<Document>, cancel: &CancelFlag) -> IngestReport {
        let mut report = IngestReport::default();
        for doc in docs {
            if cancel.is_canceled() {
                report.canceled = true;
                break;
            }
            let doc_id = doc.id.clone();
            match self.ingest(doc) {
                Ok(id) => report.ingested.push(id),
                Err(e) => {
                    warn!(doc_id = %doc_id, error = %e, "skipping document");
                    report.failed.push((doc_id, e.to_string()));
                }
            }
        }
        report
    }

    /// Pull documents from an adapter and ingest them. The offline flag
    /// gates producers that need the network; the core itself never touches
    /// it either way.
    pub fn ingest_from(
        &self,
        producer: &dyn DocumentProducer,
        cancel: &CancelFlag,
    ) -> Result<IngestReport> {
        if self.cfg.offline && producer.requires_network() {
            return Err(Error::Ingest {
                doc_id: String::new(),
                reason: "producer requires network access but offline mode is on".to_string(),
            });
        }
        let docs = producer.produce()?;
        Ok(self.ingest_all(docs, cancel))
    }

    /// Remove a document and all of its chunks and vectors.
    pub fn remove(&self, doc_id: &str) -> Result<()> {
        let mut store = self.store_mut();
        let evicted = store
            .remove(doc_id)
            .ok_or_else(|| Error::NotFound(format!("document '{doc_id}'")))?;
        for id in &evicted {
            if let Err(e) = self.index().remove(id) {
                warn!(chunk_id = %id, error = %e, "failed to remove chunk vector");
            }
        }
        drop(store);
        self.index().publish();
        info!(doc_id = %doc_id, chunks = evicted.len(), "document removed");
        Ok(())
    }
}
