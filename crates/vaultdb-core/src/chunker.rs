//! Deterministic character-window chunking.

use crate::error::{Error, Result};
use crate::types::Chunk;

#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    /// Window length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive windows. Must stay below
    /// `chunk_size`.
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self { chunk_size: 800, overlap: 80 }
    }
}

impl ChunkerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".to_string()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap {} must be smaller than chunk_size {}",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Split `text` into windows of `chunk_size` characters advancing by
/// `chunk_size - overlap`.
///
/// Identical text and config always yield identical boundaries and ordering.
/// Empty text yields no chunks; text shorter than `chunk_size` yields exactly
/// one chunk spanning the whole text. Offsets are character offsets and the
/// produced slices always fall on UTF-8 boundaries.
pub fn chunk(doc_id: &str, text: &str, cfg: ChunkerConfig) -> Result<Vec<Chunk>> {
    cfg.validate()?;
    // Byte offset of every character boundary, so windows slice valid UTF-8.
    let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    bounds.push(text.len());
    let total = bounds.len() - 1;
    if total == 0 {
        return Ok(Vec::new());
    }
    let step = cfg.chunk_size - cfg.overlap;
    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let end = usize::min(start + cfg.chunk_size, total);
        chunks.push(Chunk {
            id: format!("{}:{}", doc_id, chunks.len()),
            doc_id: doc_id.to_string(),
            start,
            end,
            text: text[bounds[start]..bounds[end]].to_string(),
        });
        if end == total {
            break;
        }
        start += step;
    }
    Ok(chunks)
}
