//! Query-time orchestration: embed, over-fetch, filter, dedupe, truncate.

use std::collections::{HashMap, HashSet};

use vaultdb_core::error::{Error, Result};
use vaultdb_core::types::{DocId, Document, IndexState, QueryResult, SourceKind};

use crate::Vault;

/// Optional query-time restriction. All populated fields must match.
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    pub sources: Option<Vec<SourceKind>>,
    pub doc_ids: Option<HashSet<DocId>>,
}

impl QueryFilter {
    pub fn by_sources(sources: Vec<SourceKind>) -> Self {
        Self { sources: Some(sources), doc_ids: None }
    }

    pub fn by_doc_ids<I: IntoIterator<Item = DocId>>(ids: I) -> Self {
        Self { sources: None, doc_ids: Some(ids.into_iter().collect()) }
    }

    fn matches(&self, doc: &Document) -> bool {
        if let Some(sources) = &self.sources {
            if !sources.contains(&doc.source) {
                return false;
            }
        }
        if let Some(ids) = &self.doc_ids {
            if !ids.contains(&doc.id) {
                return false;
            }
        }
        true
    }
}

impl Vault {
    /// Ranked similarity search over the ingested corpus.
    ///
    /// Over-fetches `k * overfetch` candidates so post-filtering can still
    /// fill `k` slots, then applies the filter, the minimum-similarity
    /// threshold and the per-document cap, and truncates. An empty index or
    /// fully filtered candidate set yields an empty result, not an error.
    pub fn query(
        &self,
        text: &str,
        k: usize,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<QueryResult>> {
        if k == 0 || self.index().state() == IndexState::Empty {
            return Ok(Vec::new());
        }
        let mut vectors = self.embedder().embed_batch(&[text.to_string()])?;
        let query_vec = vectors
            .pop()
            .ok_or_else(|| Error::Embedding("backend returned no vector".to_string()))?;

        let fetch = k.saturating_mul(self.cfg.overfetch).max(k);
        let hits = match self.index().search(&query_vec, fetch) {
            Ok(hits) => hits,
            // The index drained between the state check and the search.
            Err(Error::Query(_)) if self.index().state() == IndexState::Empty => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let store = self.store_ref();
        let mut per_doc: HashMap<DocId, usize> = HashMap::new();
        let mut results = Vec::with_capacity(k);
        for hit in hits {
            let Some(chunk) = store.chunk(&hit.chunk_id) else { continue };
            let Some(doc) = store.document(&chunk.doc_id) else { continue };
            if let Some(f) = filter {
                if !f.matches(doc) {
                    continue;
                }
            }
            if let Some(min) = self.cfg.min_score {
                if hit.score < min {
                    continue;
                }
            }
            if let Some(cap) = self.cfg.max_per_doc {
                let seen = per_doc.entry(doc.id.clone()).or_insert(0);
                if *seen >= cap {
                    continue;
                }
                *seen += 1;
            }
            results.push(QueryResult {
                chunk_id: hit.chunk_id,
                doc_id: doc.id.clone(),
                score: hit.score,
                title: doc.meta.title.clone(),
                text: chunk.text.clone(),
            });
            if results.len() == k {
                break;
            }
        }
        Ok(results)
    }
}
