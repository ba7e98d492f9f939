//! The vault context object: one explicit handle owning the document store,
//! vector index and embedding backend, with an initialize-on-start /
//! flush-on-stop lifecycle. Passed explicitly to callers; nothing ambient.

mod adapters;
mod ingest;
mod query;

pub use adapters::NoteFileProducer;
pub use ingest::IngestReport;
pub use query::QueryFilter;

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{info, warn};

use vaultdb_core::cancel::CancelFlag;
use vaultdb_core::config::VaultConfig;
use vaultdb_core::error::{Error, Result};
use vaultdb_core::traits::Embedder;
use vaultdb_core::types::{ChunkId, VaultStatus};
use vaultdb_embed::build_embedder;
use vaultdb_index::VectorIndex;
use vaultdb_store::{DocumentStore, SnapshotMeta, SNAPSHOT_VERSION};

// Chunks embedded per batch during full rebuilds.
const REBUILD_BATCH: usize = 64;

pub struct Vault {
    cfg: VaultConfig,
    embedder: Box<dyn Embedder>,
    index: VectorIndex,
    store: RwLock<DocumentStore>,
    snapshot_path: PathBuf,
    // Single-writer discipline for persistence.
    save_gate: Mutex<()>,
}

impl Vault {
    /// Initialize a vault: resolve the embedding backend once, then load the
    /// active snapshot if present.
    ///
    /// A missing snapshot starts Empty. A snapshot that fails validation
    /// propagates `IndexCorrupt` so the caller can decide between a rebuild
    /// and a fresh start; the file is left in place.
    pub fn open(cfg: VaultConfig) -> Result<Self> {
        cfg.validate()?;
        let embedder = build_embedder(&cfg)?;
        let index = VectorIndex::new(embedder.dim(), cfg.metric, cfg.index);
        let snapshot_path = cfg.snapshot_path();
        let vault = Self {
            embedder,
            index,
            store: RwLock::new(DocumentStore::new()),
            snapshot_path,
            save_gate: Mutex::new(()),
            cfg,
        };
        match vaultdb_store::load(&vault.snapshot_path) {
            Ok((meta, rows, store)) => {
                if meta.dim != vault.embedder.dim() {
                    return Err(Error::IndexCorrupt(format!(
                        "snapshot dimensionality {} does not match embedder dimensionality {}",
                        meta.dim,
                        vault.embedder.dim()
                    )));
                }
                if meta.metric != vault.cfg.metric || meta.kind != vault.cfg.index {
                    warn!(
                        snapshot_metric = ?meta.metric,
                        configured_metric = ?vault.cfg.metric,
                        "snapshot metric/kind differ from configuration; using configured values"
                    );
                }
                vault.index.rebuild_from(rows, &CancelFlag::new())?;
                *vault.store_mut() = store;
                let status = vault.status();
                info!(documents = status.documents, chunks = status.chunks, "vault restored from snapshot");
            }
            Err(Error::NotFound(_)) => {
                info!("no snapshot found; starting empty");
            }
            Err(e) => return Err(e),
        }
        Ok(vault)
    }

    pub fn config(&self) -> &VaultConfig {
        &self.cfg
    }

    /// Index state plus document/chunk counts.
    pub fn status(&self) -> VaultStatus {
        let store = self.store_ref();
        VaultStatus {
            state: self.index.state(),
            documents: store.doc_count(),
            chunks: store.chunk_count(),
            dim: self.index.dim(),
        }
    }

    /// Persist the current store + index as one atomic snapshot.
    pub fn save(&self) -> Result<()> {
        let _gate = self.save_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let store = self.store_ref();
        let rows = self.index.export();
        let meta = SnapshotMeta {
            version: SNAPSHOT_VERSION,
            metric: self.cfg.metric,
            kind: self.cfg.index,
            dim: self.index.dim(),
        };
        vaultdb_store::save(&self.snapshot_path, &meta, &rows, &store)
    }

    /// Re-embed every stored chunk and atomically replace the index.
    ///
    /// This is the recovery path after `IndexCorrupt` and the compaction
    /// path after heavy removals. Cancellation abandons the in-flight build;
    /// the published index stays authoritative.
    pub fn rebuild(&self, cancel: &CancelFlag) -> Result<()> {
        let pending: Vec<(ChunkId, String)> = {
            let store = self.store_ref();
            store
                .all_chunks()
                .iter()
                .map(|c| (c.id.clone(), c.text.clone()))
                .collect()
        };
        info!(chunks = pending.len(), "rebuilding index from document store");
        let mut rows: Vec<(ChunkId, Vec<f32>)> = Vec::with_capacity(pending.len());
        for batch in pending.chunks(REBUILD_BATCH) {
            if cancel.is_canceled() {
                return Err(Error::Canceled);
            }
            let texts: Vec<String> = batch.iter().map(|(_, t)| t.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts)?;
            for ((id, _), vector) in batch.iter().zip(embeddings) {
                rows.push((id.clone(), vector));
            }
        }
        self.index.rebuild_from(rows, cancel)
    }

    /// Flush-on-stop: persist and drop the handle.
    pub fn close(self) -> Result<()> {
        self.save()
    }

    pub(crate) fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub(crate) fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub(crate) fn store_ref(&self) -> RwLockReadGuard<'_, DocumentStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn store_mut(&self) -> RwLockWriteGuard<'_, DocumentStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }
}
