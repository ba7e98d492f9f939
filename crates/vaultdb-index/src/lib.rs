//! In-process vector index over chunk embeddings.
//!
//! Two kinds behind one contract: `Flat` scans every live row exactly; `Ivf`
//! probes a subset of clusters built at rebuild time (see `ivf` for the
//! recall trade-off). Both return ordered top-k hits with ties broken by
//! chunk id ascending.
//!
//! Mutations (`add`, `remove`, `rebuild*`) are serialized through a
//! single-writer gate. Searches take a read lock and always observe one
//! fully formed structure: rebuilds assemble the replacement off to the side
//! and swap it in under a short write lock.

mod flat;
mod ivf;
mod metric;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};

use tracing::{info, warn};
use vaultdb_core::cancel::CancelFlag;
use vaultdb_core::config::{IndexKind, Metric};
use vaultdb_core::error::{Error, Result};
use vaultdb_core::types::{ChunkId, IndexHit, IndexState};

use flat::{rank, scan, Row};
use ivf::IvfClusters;

struct Inner {
    state: IndexState,
    rows: Vec<Row>,
    by_id: HashMap<ChunkId, usize>,
    clusters: Option<IvfClusters>,
}

impl Inner {
    fn empty() -> Self {
        Self { state: IndexState::Empty, rows: Vec::new(), by_id: HashMap::new(), clusters: None }
    }

    fn live_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.deleted).count()
    }
}

pub struct VectorIndex {
    dim: usize,
    metric: Metric,
    kind: IndexKind,
    // Serializes mutations without blocking readers.
    mutate: Mutex<()>,
    inner: RwLock<Inner>,
}

impl VectorIndex {
    pub fn new(dim: usize, metric: Metric, kind: IndexKind) -> Self {
        Self {
            dim,
            metric,
            kind,
            mutate: Mutex::new(()),
            inner: RwLock::new(Inner::empty()),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn state(&self) -> IndexState {
        self.read().state
    }

    /// Number of live (non-tombstoned) entries.
    pub fn len(&self) -> usize {
        self.read().live_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or replace one vector. The index stays in `Building` until
    /// [`publish`](Self::publish) marks the ingestion transaction complete.
    pub fn add(&self, chunk_id: &str, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: vector.len() });
        }
        let _gate = self.mutate.lock().unwrap_or_else(PoisonError::into_inner);
        let mut inner = self.write();
        if inner.state == IndexState::Failed {
            return Err(Error::Query("index is in failed state; rebuild required".to_string()));
        }
        match inner.by_id.get(chunk_id).copied() {
            // An in-place update would leave a clustered row in a cluster
            // chosen for its old vector; retire it to the exact tail instead.
            Some(i) if inner.clusters.is_some() => {
                inner.rows[i].deleted = true;
                let j = inner.rows.len();
                inner.rows.push(Row { id: chunk_id.to_string(), vector, deleted: false });
                inner.by_id.insert(chunk_id.to_string(), j);
            }
            Some(i) => {
                inner.rows[i].vector = vector;
                inner.rows[i].deleted = false;
            }
            None => {
                let i = inner.rows.len();
                inner.rows.push(Row { id: chunk_id.to_string(), vector, deleted: false });
                inner.by_id.insert(chunk_id.to_string(), i);
            }
        }
        inner.state = IndexState::Building;
        Ok(())
    }

    /// Tombstone one entry. Physical compaction is deferred to the next
    /// rebuild; the id is never returned by `search` afterward.
    pub fn remove(&self, chunk_id: &str) -> Result<()> {
        let _gate = self.mutate.lock().unwrap_or_else(PoisonError::into_inner);
        let mut inner = self.write();
        if inner.state == IndexState::Failed {
            return Err(Error::Query("index is in failed state; rebuild required".to_string()));
        }
        let i = *inner
            .by_id
            .get(chunk_id)
            .ok_or_else(|| Error::NotFound(format!("chunk '{chunk_id}' not in index")))?;
        inner.rows[i].deleted = true;
        Ok(())
    }

    /// Mark the current contents queryable: `Building` becomes `Ready` (or
    /// `Empty` when nothing live remains).
    pub fn publish(&self) {
        let _gate = self.mutate.lock().unwrap_or_else(PoisonError::into_inner);
        let mut inner = self.write();
        if inner.state == IndexState::Failed {
            return;
        }
        inner.state =
            if inner.live_count() == 0 { IndexState::Empty } else { IndexState::Ready };
    }

    /// Ordered top-k by similarity. Errors when the index is empty, failed,
    /// or the query dimensionality is wrong.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<IndexHit>> {
        if query.len() != self.dim {
            return Err(Error::Query(format!(
                "query vector dimension {} does not match index dimension {}",
                query.len(),
                self.dim
            )));
        }
        let inner = self.read();
        match inner.state {
            IndexState::Empty => return Err(Error::Query("index is empty".to_string())),
            IndexState::Failed => {
                return Err(Error::Query("index is in failed state; rebuild required".to_string()))
            }
            _ => {}
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        let hits = match &inner.clusters {
            None => scan(&inner.rows, 0..inner.rows.len(), self.metric, query),
            Some(clusters) => {
                let mut candidates: Vec<usize> = Vec::new();
                for ci in clusters.probe_order(query) {
                    candidates.extend_from_slice(&clusters.assignments[ci]);
                }
                // Post-build inserts live in an exact tail.
                candidates.extend(clusters.built_rows..inner.rows.len());
                scan(&inner.rows, candidates.into_iter(), self.metric, query)
            }
        };
        Ok(rank(hits, k))
    }

    /// Live rows, id-sorted, for persistence.
    pub fn export(&self) -> Vec<(ChunkId, Vec<f32>)> {
        let inner = self.read();
        let mut rows: Vec<(ChunkId, Vec<f32>)> = inner
            .rows
            .iter()
            .filter(|r| !r.deleted)
            .map(|r| (r.id.clone(), r.vector.clone()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }

    /// Recluster and compact the current live rows.
    pub fn rebuild(&self, cancel: &CancelFlag) -> Result<()> {
        let rows = self.export();
        self.rebuild_from(rows, cancel)
    }

    /// Atomically replace the index contents with the given vectors.
    ///
    /// The replacement is assembled without holding the read path's lock and
    /// swapped in whole; readers observe either the old or the new
    /// structure, never a partial one. On cancellation the previously
    /// published structure stays authoritative.
    pub fn rebuild_from(
        &self,
        rows: Vec<(ChunkId, Vec<f32>)>,
        cancel: &CancelFlag,
    ) -> Result<()> {
        for (id, v) in &rows {
            if v.len() != self.dim {
                warn!(chunk_id = %id, got = v.len(), expected = self.dim, "rejecting rebuild");
                return Err(Error::DimensionMismatch { expected: self.dim, actual: v.len() });
            }
        }
        let _gate = self.mutate.lock().unwrap_or_else(PoisonError::into_inner);
        let prev_state = {
            let mut inner = self.write();
            let prev = inner.state;
            inner.state = IndexState::Rebuilding;
            prev
        };

        match self.construct(rows, cancel) {
            Ok(fresh) => {
                info!(entries = fresh.rows.len(), kind = ?self.kind, "index rebuilt");
                *self.write() = fresh;
                Ok(())
            }
            Err(Error::Canceled) => {
                self.write().state = prev_state;
                Err(Error::Canceled)
            }
            Err(e) => {
                self.write().state = IndexState::Failed;
                Err(e)
            }
        }
    }

    fn construct(&self, rows: Vec<(ChunkId, Vec<f32>)>, cancel: &CancelFlag) -> Result<Inner> {
        if cancel.is_canceled() {
            return Err(Error::Canceled);
        }
        // Last write wins on duplicate ids; id-sorted for determinism.
        let mut dedup: HashMap<ChunkId, Vec<f32>> = HashMap::new();
        for (id, v) in rows {
            dedup.insert(id, v);
        }
        let mut fresh: Vec<Row> = dedup
            .into_iter()
            .map(|(id, vector)| Row { id, vector, deleted: false })
            .collect();
        fresh.sort_by(|a, b| a.id.cmp(&b.id));
        let by_id: HashMap<ChunkId, usize> =
            fresh.iter().enumerate().map(|(i, r)| (r.id.clone(), i)).collect();
        let clusters = match self.kind {
            IndexKind::Flat => None,
            IndexKind::Ivf => ivf::build(&fresh, cancel)?,
        };
        let state = if fresh.is_empty() { IndexState::Empty } else { IndexState::Ready };
        Ok(Inner { state, rows: fresh, by_id, clusters })
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
