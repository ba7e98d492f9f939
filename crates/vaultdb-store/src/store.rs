//! In-memory document store, independent of the vector index.
//!
//! Owns the canonical Document and Chunk records. Documents are immutable
//! once ingested; `upsert` under an existing id is a full replace and hands
//! back the evicted chunk ids so the caller can drop them from the index in
//! the same transaction.

use std::collections::HashMap;

use vaultdb_core::types::{Chunk, ChunkId, DocId, Document};

#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: HashMap<DocId, Document>,
    chunks: HashMap<DocId, Vec<Chunk>>,
    chunk_owner: HashMap<ChunkId, DocId>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document with its chunks, replacing any previous version
    /// under the same id. Returns the replaced version's chunk ids.
    pub fn upsert(&mut self, doc: Document, chunks: Vec<Chunk>) -> Vec<ChunkId> {
        let evicted = self.remove(&doc.id).unwrap_or_default();
        for c in &chunks {
            self.chunk_owner.insert(c.id.clone(), doc.id.clone());
        }
        self.chunks.insert(doc.id.clone(), chunks);
        self.docs.insert(doc.id.clone(), doc);
        evicted
    }

    /// Remove a document and its chunks; returns the removed chunk ids, or
    /// `None` if the document is unknown.
    pub fn remove(&mut self, doc_id: &str) -> Option<Vec<ChunkId>> {
        self.docs.remove(doc_id)?;
        let chunks = self.chunks.remove(doc_id).unwrap_or_default();
        let ids: Vec<ChunkId> = chunks.into_iter().map(|c| c.id).collect();
        for id in &ids {
            self.chunk_owner.remove(id);
        }
        Some(ids)
    }

    pub fn document(&self, doc_id: &str) -> Option<&Document> {
        self.docs.get(doc_id)
    }

    pub fn chunk(&self, chunk_id: &str) -> Option<&Chunk> {
        let owner = self.chunk_owner.get(chunk_id)?;
        self.chunks.get(owner)?.iter().find(|c| c.id == chunk_id)
    }

    pub fn chunks_of(&self, doc_id: &str) -> Option<&[Chunk]> {
        self.chunks.get(doc_id).map(Vec::as_slice)
    }

    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// All documents, id-sorted for deterministic iteration.
    pub fn documents(&self) -> Vec<&Document> {
        let mut docs: Vec<&Document> = self.docs.values().collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        docs
    }

    /// All chunks grouped by id-sorted document, preserving chunk order
    /// within each document.
    pub fn all_chunks(&self) -> Vec<&Chunk> {
        let mut out = Vec::with_capacity(self.chunk_count());
        for doc in self.documents() {
            if let Some(chunks) = self.chunks.get(&doc.id) {
                out.extend(chunks.iter());
            }
        }
        out
    }
}
