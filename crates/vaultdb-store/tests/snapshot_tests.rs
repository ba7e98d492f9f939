use std::fs;

use vaultdb_core::config::{IndexKind, Metric};
use vaultdb_core::error::Error;
use vaultdb_core::types::{Chunk, Document, SourceKind};
use vaultdb_store::{load, save, DocumentStore, SnapshotMeta, SNAPSHOT_VERSION};

fn sample_store() -> (DocumentStore, Vec<(String, Vec<f32>)>) {
    let mut store = DocumentStore::new();
    let doc = Document::new(
        "d1".to_string(),
        SourceKind::Note,
        "alpha bravo charlie".to_string(),
        "Field notes".to_string(),
        "notes/field.txt".to_string(),
    );
    let chunks = vec![
        Chunk { id: "d1:0".to_string(), doc_id: "d1".to_string(), start: 0, end: 11, text: "alpha bravo".to_string() },
        Chunk { id: "d1:1".to_string(), doc_id: "d1".to_string(), start: 11, end: 19, text: " charlie".to_string() },
    ];
    store.upsert(doc, chunks);
    let rows = vec![
        ("d1:0".to_string(), vec![0.1f32, 0.2, 0.3]),
        ("d1:1".to_string(), vec![0.4f32, 0.5, 0.6]),
    ];
    (store, rows)
}

fn meta() -> SnapshotMeta {
    SnapshotMeta { version: SNAPSHOT_VERSION, metric: Metric::Cosine, kind: IndexKind::Flat, dim: 3 }
}

#[test]
fn round_trip_preserves_vectors_and_metadata() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("vault.snapshot");
    let (store, rows) = sample_store();

    save(&path, &meta(), &rows, &store).expect("save");
    let (loaded_meta, loaded_rows, loaded_store) = load(&path).expect("load");

    assert_eq!(loaded_meta, meta());
    assert_eq!(loaded_rows, rows);
    assert_eq!(loaded_store.doc_count(), 1);
    assert_eq!(loaded_store.chunk_count(), 2);
    let doc = loaded_store.document("d1").expect("doc");
    assert_eq!(doc.meta.title, "Field notes");
    let chunk = loaded_store.chunk("d1:1").expect("chunk");
    assert_eq!(chunk.text, " charlie");
}

#[test]
fn missing_snapshot_is_not_found() {
    let tmp = tempfile::tempdir().expect("tempdir");
    match load(&tmp.path().join("absent.snapshot")) {
        Err(Error::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn truncated_by_one_byte_is_corrupt() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("vault.snapshot");
    let (store, rows) = sample_store();
    save(&path, &meta(), &rows, &store).expect("save");

    let bytes = fs::read(&path).expect("read");
    fs::write(&path, &bytes[..bytes.len() - 1]).expect("truncate");
    match load(&path) {
        Err(Error::IndexCorrupt(_)) => {}
        other => panic!("expected IndexCorrupt, got {other:?}"),
    }
}

#[test]
fn flipped_byte_fails_checksum() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("vault.snapshot");
    let (store, rows) = sample_store();
    save(&path, &meta(), &rows, &store).expect("save");

    let mut bytes = fs::read(&path).expect("read");
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0xff;
    fs::write(&path, &bytes).expect("write");
    assert!(matches!(load(&path), Err(Error::IndexCorrupt(_))));
}

#[test]
fn unrecognized_version_is_rejected() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("vault.snapshot");
    let (store, rows) = sample_store();
    let bad = SnapshotMeta { version: 99, ..meta() };
    save(&path, &bad, &rows, &store).expect("save");
    match load(&path) {
        Err(Error::IndexCorrupt(msg)) => assert!(msg.contains("version")),
        other => panic!("expected IndexCorrupt, got {other:?}"),
    }
}

#[test]
fn garbage_file_is_corrupt_not_a_panic() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("vault.snapshot");
    fs::write(&path, b"definitely not a snapshot").expect("write");
    assert!(matches!(load(&path), Err(Error::IndexCorrupt(_))));
}

#[test]
fn save_rejects_vectors_of_the_wrong_dimension() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("vault.snapshot");
    let (store, _) = sample_store();
    let rows = vec![("d1:0".to_string(), vec![0.1f32, 0.2]), ("d1:1".to_string(), vec![0.3f32, 0.4])];
    assert!(matches!(
        save(&path, &meta(), &rows, &store),
        Err(Error::DimensionMismatch { expected: 3, actual: 2 })
    ));
}

#[test]
fn failed_save_never_clobbers_the_previous_snapshot() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("vault.snapshot");
    let (store, rows) = sample_store();
    save(&path, &meta(), &rows, &store).expect("save");

    // A save that errors out before publishing leaves the old file intact.
    let bad_rows = vec![("d1:0".to_string(), vec![0.1f32])];
    assert!(save(&path, &meta(), &bad_rows, &store).is_err());
    let (_, loaded_rows, _) = load(&path).expect("old snapshot still valid");
    assert_eq!(loaded_rows, rows);
}

#[test]
fn store_replace_and_remove_evict_chunk_ids() {
    let (mut store, _) = sample_store();
    let doc2 = Document::new(
        "d1".to_string(),
        SourceKind::Note,
        "replacement".to_string(),
        "Field notes v2".to_string(),
        "notes/field.txt".to_string(),
    );
    let chunks2 = vec![Chunk {
        id: "d1:0".to_string(),
        doc_id: "d1".to_string(),
        start: 0,
        end: 11,
        text: "replacement".to_string(),
    }];
    let evicted = store.upsert(doc2, chunks2);
    assert_eq!(evicted, vec!["d1:0".to_string(), "d1:1".to_string()]);
    assert_eq!(store.chunk_count(), 1);

    let removed = store.remove("d1").expect("remove");
    assert_eq!(removed, vec!["d1:0".to_string()]);
    assert!(store.is_empty());
    assert!(store.remove("d1").is_none());
}
