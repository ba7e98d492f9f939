use vaultdb_core::config::{TruncationPolicy, VaultConfig};
use vaultdb_core::error::Error;
use vaultdb_core::traits::Embedder;
use vaultdb_embed::{build_embedder, HashedEmbedder};

#[test]
fn hashed_embedder_shapes_and_determinism() {
    let embedder = HashedEmbedder::new(384, TruncationPolicy::Truncate);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim is 384");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[test]
fn batching_does_not_change_per_item_results() {
    let embedder = HashedEmbedder::new(64, TruncationPolicy::Truncate);
    let texts = vec![
        "growing potatoes in sandy soil".to_string(),
        "preserving tomatoes for winter".to_string(),
        "solar power for a small cabin".to_string(),
    ];
    let batched = embedder.embed_batch(&texts).expect("batch");
    assert_eq!(batched.len(), texts.len(), "output preserves input length");
    for (i, text) in texts.iter().enumerate() {
        let single = embedder.embed_batch(std::slice::from_ref(text)).expect("single");
        assert_eq!(batched[i], single[0], "item {i} differs between batch and single");
    }
}

#[test]
fn distinct_texts_get_distinct_vectors() {
    let embedder = HashedEmbedder::new(128, TruncationPolicy::Truncate);
    let embs = embedder
        .embed_batch(&["first text".to_string(), "second text".to_string()])
        .expect("embed");
    assert_ne!(embs[0], embs[1]);
}

#[test]
fn over_length_input_errors_under_strict_policy() {
    let embedder = HashedEmbedder::with_max_len(32, TruncationPolicy::Error, 4);
    let long = "one two three four five".to_string();
    match embedder.embed_batch(&[long]) {
        Err(Error::Embedding(msg)) => assert!(msg.contains("maximum length")),
        other => panic!("expected Embedding error, got {other:?}"),
    }
}

#[test]
fn over_length_input_truncates_under_truncate_policy() {
    let embedder = HashedEmbedder::with_max_len(32, TruncationPolicy::Truncate, 4);
    let long = "one two three four five six".to_string();
    let short = "one two three four".to_string();
    let a = embedder.embed_batch(&[long]).expect("truncated");
    let b = embedder.embed_batch(&[short]).expect("short");
    assert_eq!(a[0], b[0], "truncated input embeds like its prefix");
}

#[test]
fn empty_batch_yields_empty_output() {
    let embedder = HashedEmbedder::new(16, TruncationPolicy::Truncate);
    let embs = embedder.embed_batch(&[]).expect("embed");
    assert!(embs.is_empty());
}

#[test]
fn factory_resolves_hashed_backend_from_config() {
    let cfg = VaultConfig::default();
    let embedder = build_embedder(&cfg).expect("factory");
    assert_eq!(embedder.dim(), cfg.hashed_dim);
    assert!(embedder.id().starts_with("hashed:"));
}
