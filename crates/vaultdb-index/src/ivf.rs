//! Approximate variant: inverted-file clustering over the stored rows.
//!
//! Recall trade-off: only `nprobe` of `nlist` clusters are scanned per
//! query, so a true neighbor assigned to an unprobed cluster can be missed.
//! Rows inserted after the last rebuild live in an exactly-scanned tail and
//! are never missed. Corpora below [`MIN_CLUSTERED_ROWS`] are not clustered
//! at all and keep exact recall.

use tracing::debug;
use vaultdb_core::cancel::CancelFlag;
use vaultdb_core::error::{Error, Result};

use crate::flat::Row;
use crate::metric::euclidean;

/// Below this many live rows clustering buys nothing; everything stays in
/// the exact-scan tail.
pub(crate) const MIN_CLUSTERED_ROWS: usize = 64;

const KMEANS_ITERS: usize = 8;
const MAX_NLIST: usize = 256;

#[derive(Debug, Clone)]
pub(crate) struct IvfClusters {
    pub centroids: Vec<Vec<f32>>,
    /// Row indices per cluster, valid for the row vector the build saw.
    pub assignments: Vec<Vec<usize>>,
    /// Rows at index >= built_rows were added after the build and are
    /// scanned exactly.
    pub built_rows: usize,
    pub nprobe: usize,
}

impl IvfClusters {
    /// Indices of the clusters nearest to `query`, best first.
    pub fn probe_order(&self, query: &[f32]) -> Vec<usize> {
        let mut order: Vec<(usize, f32)> = self
            .centroids
            .iter()
            .enumerate()
            .map(|(i, c)| (i, euclidean(query, c)))
            .collect();
        order.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        order.into_iter().take(self.nprobe).map(|(i, _)| i).collect()
    }
}

/// Deterministic k-means over the live rows: seeds are evenly spaced over
/// the id-sorted rows, iterations are fixed, no randomness anywhere.
pub(crate) fn build(rows: &[Row], cancel: &CancelFlag) -> Result<Option<IvfClusters>> {
    let live: Vec<usize> = (0..rows.len()).filter(|&i| !rows[i].deleted).collect();
    let n = live.len();
    if n < MIN_CLUSTERED_ROWS {
        return Ok(None);
    }

    let nlist = ((n as f64).sqrt() as usize).clamp(1, MAX_NLIST);
    let nprobe = (nlist / 4).max(1);

    // Seed centroids from evenly spaced live rows.
    let mut centroids: Vec<Vec<f32>> = (0..nlist)
        .map(|c| rows[live[c * n / nlist]].vector.clone())
        .collect();
    let mut assignments: Vec<Vec<usize>> = vec![Vec::new(); nlist];

    for iter in 0..KMEANS_ITERS {
        if cancel.is_canceled() {
            return Err(Error::Canceled);
        }
        for a in &mut assignments {
            a.clear();
        }
        for &ri in &live {
            let mut best = 0usize;
            let mut best_d = f32::INFINITY;
            for (ci, c) in centroids.iter().enumerate() {
                let d = euclidean(&rows[ri].vector, c);
                if d < best_d {
                    best_d = d;
                    best = ci;
                }
            }
            assignments[best].push(ri);
        }
        // Recompute centroids as member means; empty clusters keep their
        // previous centroid.
        for (ci, members) in assignments.iter().enumerate() {
            if members.is_empty() {
                continue;
            }
            let dim = centroids[ci].len();
            let mut mean = vec![0f32; dim];
            for &ri in members {
                for (m, v) in mean.iter_mut().zip(rows[ri].vector.iter()) {
                    *m += v;
                }
            }
            let inv = 1.0 / members.len() as f32;
            for m in &mut mean {
                *m *= inv;
            }
            centroids[ci] = mean;
        }
        debug!(iter, nlist, "ivf k-means iteration done");
    }

    Ok(Some(IvfClusters { centroids, assignments, built_rows: rows.len(), nprobe }))
}
