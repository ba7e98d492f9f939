use std::path::Path;

use vaultdb_core::cancel::CancelFlag;
use vaultdb_core::config::VaultConfig;
use vaultdb_core::error::Error;
use vaultdb_core::types::{Document, IndexState, SourceKind};
use vaultdb_engine::Vault;

fn test_config(data_dir: &Path) -> VaultConfig {
    VaultConfig {
        data_dir: data_dir.to_path_buf(),
        chunk_size: 200,
        chunk_overlap: 0,
        hashed_dim: 64,
        ..VaultConfig::default()
    }
}

fn doc(id: &str, text: String) -> Document {
    Document::new(id.to_string(), SourceKind::Note, text, format!("{id} title"), String::new())
}

fn words(n: usize) -> String {
    // Deterministic filler with distinct words, sized in characters.
    let mut out = String::new();
    let mut i = 0usize;
    while out.len() < n {
        out.push_str(&format!("word{i} "));
        i += 1;
    }
    out.truncate(n);
    out
}

#[test]
fn chunk_counts_match_document_lengths() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let vault = Vault::open(test_config(tmp.path())).expect("open");

    let mut cumulative = 0usize;
    for (id, len, expected) in [("small", 50usize, 1usize), ("medium", 250, 2), ("large", 600, 3)] {
        vault.ingest(doc(id, words(len))).expect("ingest");
        cumulative += expected;
        assert_eq!(vault.status().chunks, cumulative, "cumulative chunk count after {id}");
    }

    let status = vault.status();
    assert_eq!(status.documents, 3);
    assert_eq!(status.chunks, 6);
    assert_eq!(status.state, IndexState::Ready);
}

#[test]
fn querying_a_known_chunk_text_ranks_it_first_with_max_score() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let vault = Vault::open(test_config(tmp.path())).expect("open");
    let text = words(250);
    vault.ingest(doc("d1", text.clone())).expect("ingest");
    vault.ingest(doc("d2", words(180))).expect("ingest");

    // The first chunk of d1 covers characters [0, 200).
    let probe: String = text.chars().take(200).collect();
    let results = vault.query(&probe, 3, None).expect("query");
    assert!(!results.is_empty());
    assert_eq!(results[0].chunk_id, "d1:0");
    assert!((results[0].score - 1.0).abs() < 1e-5, "identical text maxes cosine similarity");
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score, "scores non-increasing");
    }
}

#[test]
fn index_entries_match_store_chunks_one_to_one() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let vault = Vault::open(test_config(tmp.path())).expect("open");
    vault.ingest(doc("a", words(450))).expect("ingest");
    vault.ingest(doc("b", words(120))).expect("ingest");

    let status = vault.status();
    // Every chunk resolvable through a query and no orphans either way.
    let results = vault.query(&words(40), status.chunks + 10, None).expect("query");
    assert_eq!(results.len(), status.chunks, "every index entry resolves to a stored chunk");
}

#[test]
fn reingest_under_same_id_is_idempotent() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let vault = Vault::open(test_config(tmp.path())).expect("open");
    let text = words(450);
    vault.ingest(doc("d", text.clone())).expect("first");
    let before = vault.status();
    vault.ingest(doc("d", text.clone())).expect("second");
    let after = vault.status();

    assert_eq!(before.documents, after.documents);
    assert_eq!(before.chunks, after.chunks, "no duplicate accumulation");

    let probe: String = text.chars().take(200).collect();
    let results = vault.query(&probe, 10, None).expect("query");
    let top_ids: Vec<&str> = results.iter().map(|r| r.chunk_id.as_str()).collect();
    assert_eq!(top_ids.iter().filter(|id| **id == "d:0").count(), 1);
}

#[test]
fn replacement_text_fully_replaces_old_chunks() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let vault = Vault::open(test_config(tmp.path())).expect("open");
    let old_text = words(450);
    vault.ingest(doc("d", old_text.clone())).expect("first");
    vault.ingest(doc("d", words(120))).expect("replace");

    assert_eq!(vault.status().chunks, 1);
    let probe: String = old_text.chars().skip(200).take(200).collect();
    let results = vault.query(&probe, 10, None).expect("query");
    assert!(results.iter().all(|r| r.chunk_id != "d:1"), "old second chunk is gone");
}

#[test]
fn removing_a_document_removes_its_results() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let vault = Vault::open(test_config(tmp.path())).expect("open");
    vault.ingest(doc("keep", words(150))).expect("ingest");
    vault.ingest(doc("drop", words(150))).expect("ingest");

    vault.remove("drop").expect("remove");
    assert_eq!(vault.status().documents, 1);
    let results = vault.query(&words(150), 10, None).expect("query");
    assert!(results.iter().all(|r| r.doc_id == "keep"));

    assert!(matches!(vault.remove("drop"), Err(Error::NotFound(_))));
}

#[test]
fn empty_vault_query_returns_empty_not_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let vault = Vault::open(test_config(tmp.path())).expect("open");
    let results = vault.query("anything", 5, None).expect("query");
    assert!(results.is_empty());
}

#[test]
fn snapshot_round_trip_returns_identical_ranked_results() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let probes = [words(200), words(77), "word3 word4 word5".to_string()];

    let vault = Vault::open(cfg.clone()).expect("open");
    vault.ingest(doc("a", words(450))).expect("ingest");
    vault.ingest(doc("b", words(260))).expect("ingest");
    vault.ingest(doc("c", words(90))).expect("ingest");
    let before: Vec<Vec<_>> =
        probes.iter().map(|p| vault.query(p, 5, None).expect("query")).collect();
    vault.close().expect("close");

    let reopened = Vault::open(cfg).expect("reopen");
    for (probe, expected) in probes.iter().zip(before) {
        let after = reopened.query(probe, 5, None).expect("query");
        assert_eq!(after.len(), expected.len());
        for (a, b) in after.iter().zip(expected.iter()) {
            assert_eq!(a.chunk_id, b.chunk_id, "same ids after reload");
            assert_eq!(a.score, b.score, "same scores after reload");
        }
    }
}

#[test]
fn corrupt_snapshot_fails_load_and_rebuild_restores_results() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());

    let vault = Vault::open(cfg.clone()).expect("open");
    vault.ingest(doc("a", words(450))).expect("ingest");
    vault.ingest(doc("b", words(260))).expect("ingest");
    let probe = words(200);
    let expected = vault.query(&probe, 5, None).expect("query");
    vault.save().expect("save");

    // Truncate the active snapshot by one byte.
    let snap = cfg.snapshot_path();
    let bytes = std::fs::read(&snap).expect("read");
    std::fs::write(&snap, &bytes[..bytes.len() - 1]).expect("truncate");
    match Vault::open(cfg.clone()) {
        Err(Error::IndexCorrupt(_)) => {}
        other => panic!("expected IndexCorrupt, got {:?}", other.map(|_| "vault")),
    }

    // The still-running vault rebuilds from its document store and re-saves.
    vault.rebuild(&CancelFlag::new()).expect("rebuild");
    vault.save().expect("resave");
    let reopened = Vault::open(cfg).expect("open after repair");
    let after = reopened.query(&probe, 5, None).expect("query");
    assert_eq!(after.len(), expected.len());
    for (a, b) in after.iter().zip(expected.iter()) {
        assert_eq!(a.chunk_id, b.chunk_id);
        assert_eq!(a.score, b.score);
    }
}

#[test]
fn canceled_rebuild_leaves_published_index_intact() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let vault = Vault::open(test_config(tmp.path())).expect("open");
    vault.ingest(doc("a", words(300))).expect("ingest");
    let before = vault.query(&words(120), 5, None).expect("query");

    let cancel = CancelFlag::new();
    cancel.cancel();
    assert!(matches!(vault.rebuild(&cancel), Err(Error::Canceled)));

    let after = vault.query(&words(120), 5, None).expect("query");
    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(after.iter()) {
        assert_eq!(a.chunk_id, b.chunk_id);
        assert_eq!(a.score, b.score);
    }
}

#[test]
fn batch_ingest_isolates_per_document_failures() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let vault = Vault::open(test_config(tmp.path())).expect("open");
    let docs = vec![
        doc("good1", words(100)),
        doc("bad", String::new()), // no text -> IngestError, skipped
        doc("good2", words(100)),
    ];
    let report = vault.ingest_all(docs, &CancelFlag::new());
    assert_eq!(report.ingested, vec!["good1".to_string(), "good2".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "bad");
    assert!(!report.canceled);
    assert_eq!(vault.status().documents, 2);
}

#[test]
fn canceled_batch_stops_and_reports() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let vault = Vault::open(test_config(tmp.path())).expect("open");
    let cancel = CancelFlag::new();
    cancel.cancel();
    let report = vault.ingest_all(vec![doc("a", words(100))], &cancel);
    assert!(report.canceled);
    assert!(report.ingested.is_empty());
    assert_eq!(vault.status().documents, 0);
}
