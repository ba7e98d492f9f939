//! Similarity scoring.
//!
//! Scores are arranged so that higher always means closer, regardless of the
//! configured metric: cosine similarity as-is, euclidean as the negated
//! distance. Result ordering is therefore uniformly non-increasing.

use vaultdb_core::config::Metric;

pub(crate) fn score(metric: Metric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        Metric::Cosine => cosine(a, b),
        Metric::Euclidean => -euclidean(a, b),
    }
}

/// Plain euclidean distance, used for cluster assignment regardless of the
/// query metric.
pub(crate) fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0f32;
    let mut na = 0f32;
    let mut nb = 0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    let denom = (na.sqrt() * nb.sqrt()).max(1e-12);
    dot / denom
}
