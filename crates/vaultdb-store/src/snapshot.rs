//! Versioned, checksummed snapshot of index vectors + document metadata.
//!
//! Layout:
//! `magic "VLTSNAP1" | version u16 | metric u8 | kind u8 | dim u32 |
//! vector_count u64 | rows (id_len u16, id bytes, dim x f32 LE) |
//! meta_len u64 | document/chunk JSON block | blake3 checksum (32 bytes)`.
//!
//! Saves go to a temp file in the target directory, are fsynced, then
//! renamed over the active snapshot, so a crash mid-write never clobbers
//! the previously valid snapshot. Loads reject anything that fails the
//! magic/version/layout/checksum checks with `IndexCorrupt` and never
//! panic.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use vaultdb_core::config::{IndexKind, Metric};
use vaultdb_core::error::{Error, Result};
use vaultdb_core::types::{Chunk, ChunkId, Document};

use crate::store::DocumentStore;

pub const SNAPSHOT_VERSION: u16 = 1;
const MAGIC: &[u8; 8] = b"VLTSNAP1";
const CHECKSUM_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotMeta {
    pub version: u16,
    pub metric: Metric,
    pub kind: IndexKind,
    pub dim: usize,
}

#[derive(Serialize, Deserialize)]
struct StoreBlock {
    documents: Vec<Document>,
    chunks: Vec<Chunk>,
}

fn corrupt(msg: impl Into<String>) -> Error {
    Error::IndexCorrupt(msg.into())
}

fn metric_tag(m: Metric) -> u8 {
    match m {
        Metric::Cosine => 0,
        Metric::Euclidean => 1,
    }
}

fn metric_from_tag(t: u8) -> Result<Metric> {
    match t {
        0 => Ok(Metric::Cosine),
        1 => Ok(Metric::Euclidean),
        other => Err(corrupt(format!("unknown metric tag {other}"))),
    }
}

fn kind_tag(k: IndexKind) -> u8 {
    match k {
        IndexKind::Flat => 0,
        IndexKind::Ivf => 1,
    }
}

fn kind_from_tag(t: u8) -> Result<IndexKind> {
    match t {
        0 => Ok(IndexKind::Flat),
        1 => Ok(IndexKind::Ivf),
        other => Err(corrupt(format!("unknown index kind tag {other}"))),
    }
}

/// Write one snapshot atomically: full temp file + fsync + rename.
pub fn save(
    path: &Path,
    meta: &SnapshotMeta,
    rows: &[(ChunkId, Vec<f32>)],
    store: &DocumentStore,
) -> Result<()> {
    let mut buf: Vec<u8> = Vec::new();
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&meta.version.to_le_bytes());
    buf.push(metric_tag(meta.metric));
    buf.push(kind_tag(meta.kind));
    buf.extend_from_slice(&(meta.dim as u32).to_le_bytes());
    buf.extend_from_slice(&(rows.len() as u64).to_le_bytes());
    for (id, vector) in rows {
        if vector.len() != meta.dim {
            return Err(Error::DimensionMismatch { expected: meta.dim, actual: vector.len() });
        }
        let id_bytes = id.as_bytes();
        if id_bytes.len() > u16::MAX as usize {
            return Err(corrupt(format!("chunk id of {} bytes exceeds limit", id_bytes.len())));
        }
        buf.extend_from_slice(&(id_bytes.len() as u16).to_le_bytes());
        buf.extend_from_slice(id_bytes);
        for x in vector {
            buf.extend_from_slice(&x.to_le_bytes());
        }
    }

    let block = StoreBlock {
        documents: store.documents().into_iter().cloned().collect(),
        chunks: store.all_chunks().into_iter().cloned().collect(),
    };
    let block_bytes = serde_json::to_vec(&block)
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    buf.extend_from_slice(&(block_bytes.len() as u64).to_le_bytes());
    buf.extend_from_slice(&block_bytes);

    let checksum = blake3::hash(&buf);
    buf.extend_from_slice(checksum.as_bytes());

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&buf)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    info!(path = %path.display(), vectors = rows.len(), bytes = buf.len(), "snapshot saved");
    Ok(())
}

/// Read and validate a snapshot. Missing file is `NotFound` (a fresh start,
/// not corruption); any structural failure is `IndexCorrupt`.
pub fn load(path: &Path) -> Result<(SnapshotMeta, Vec<(ChunkId, Vec<f32>)>, DocumentStore)> {
    if !path.exists() {
        return Err(Error::NotFound(format!("no snapshot at {}", path.display())));
    }
    let buf = std::fs::read(path)?;
    if buf.len() < MAGIC.len() + CHECKSUM_LEN {
        return Err(corrupt("snapshot shorter than header"));
    }
    let (body, tail) = buf.split_at(buf.len() - CHECKSUM_LEN);
    if blake3::hash(body).as_bytes() != tail {
        return Err(corrupt("checksum mismatch"));
    }

    let mut cur = Cursor { buf: body, pos: 0 };
    if cur.take(MAGIC.len())? != MAGIC {
        return Err(corrupt("bad magic"));
    }
    let version = cur.u16()?;
    if version != SNAPSHOT_VERSION {
        return Err(corrupt(format!("unrecognized snapshot version {version}")));
    }
    let metric = metric_from_tag(cur.u8()?)?;
    let kind = kind_from_tag(cur.u8()?)?;
    let dim = cur.u32()? as usize;
    let count = cur.u64()? as usize;
    if dim == 0 && count > 0 {
        return Err(corrupt("zero dimensionality with stored vectors"));
    }

    let mut rows: Vec<(ChunkId, Vec<f32>)> = Vec::with_capacity(count.min(1 << 20));
    for _ in 0..count {
        let id_len = cur.u16()? as usize;
        let id = std::str::from_utf8(cur.take(id_len)?)
            .map_err(|_| corrupt("chunk id is not UTF-8"))?
            .to_string();
        let raw = cur.take(dim * 4)?;
        let mut vector = Vec::with_capacity(dim);
        for c in raw.chunks_exact(4) {
            vector.push(f32::from_le_bytes([c[0], c[1], c[2], c[3]]));
        }
        rows.push((id, vector));
    }

    let block_len = cur.u64()? as usize;
    let block: StoreBlock = serde_json::from_slice(cur.take(block_len)?)
        .map_err(|e| corrupt(format!("metadata block: {e}")))?;
    if cur.pos != body.len() {
        return Err(corrupt("trailing data after metadata block"));
    }

    let mut store = DocumentStore::new();
    let mut by_doc: std::collections::HashMap<String, Vec<Chunk>> = std::collections::HashMap::new();
    for chunk in block.chunks {
        by_doc.entry(chunk.doc_id.clone()).or_default().push(chunk);
    }
    for doc in block.documents {
        let chunks = by_doc.remove(&doc.id).unwrap_or_default();
        store.upsert(doc, chunks);
    }
    if !by_doc.is_empty() {
        return Err(corrupt("chunks referencing unknown documents"));
    }
    if store.chunk_count() != rows.len() {
        return Err(corrupt(format!(
            "vector count {} does not match chunk count {}",
            rows.len(),
            store.chunk_count()
        )));
    }

    let meta = SnapshotMeta { version, metric, kind, dim };
    info!(path = %path.display(), vectors = rows.len(), "snapshot loaded");
    Ok((meta, rows, store))
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or_else(|| corrupt("length overflow"))?;
        if end > self.buf.len() {
            return Err(corrupt("unexpected end of snapshot"));
        }
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }
}
