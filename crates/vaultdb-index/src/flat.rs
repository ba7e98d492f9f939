//! Exact scoring over stored rows, shared by the flat index and the IVF
//! tail/cluster scans.

use std::cmp::Ordering;

use vaultdb_core::config::Metric;
use vaultdb_core::types::IndexHit;

use crate::metric::score;

#[derive(Debug, Clone)]
pub(crate) struct Row {
    pub id: String,
    pub vector: Vec<f32>,
    pub deleted: bool,
}

/// Score the given row indices against `query`, skipping tombstones.
pub(crate) fn scan(
    rows: &[Row],
    indices: impl Iterator<Item = usize>,
    metric: Metric,
    query: &[f32],
) -> Vec<IndexHit> {
    let mut hits = Vec::new();
    for i in indices {
        let row = &rows[i];
        if row.deleted {
            continue;
        }
        hits.push(IndexHit {
            chunk_id: row.id.clone(),
            score: score(metric, query, &row.vector),
        });
    }
    hits
}

/// Order by score descending, ties broken by chunk id ascending for
/// determinism, then truncate to `k`.
pub(crate) fn rank(mut hits: Vec<IndexHit>, k: usize) -> Vec<IndexHit> {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.chunk_id.cmp(&b.chunk_id))
    });
    hits.truncate(k);
    hits
}
