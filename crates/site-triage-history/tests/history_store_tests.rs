//! Integration tests for the file-backed history store.

use site_triage_core::{AnalysisRecord, ClassificationResult, Label};
use site_triage_history::{HISTORY_FILE_NAME, HistoryEntry, HistoryError, HistoryStore};

fn entry(id: &str) -> HistoryEntry {
    HistoryEntry::new(
        id,
        format!("{id}-upload.png"),
        ClassificationResult {
            label: Label::Yellow,
            risk_score: 30,
            explanation: "Moderate concern: redness (60% extent), swelling (risk score 30)."
                .to_string(),
        },
        AnalysisRecord::with_defaults(format!("{id}-upload.png")),
    )
    .expect("entry should build")
}

#[test]
fn history_store_tests_keep_newest_first_and_cap() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let store = HistoryStore::open(dir.path(), 3).expect("store should open");

    for id in ["a", "b", "c", "d", "e"] {
        store.append(entry(id)).expect("append should succeed");
    }

    let ids: Vec<String> = store
        .load()
        .expect("history should load")
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(ids, vec!["e", "d", "c"]);
}

#[test]
fn history_store_tests_missing_file_is_empty() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let store = HistoryStore::open(dir.path(), 10).expect("store should open");
    assert!(store.load().expect("history should load").is_empty());
}

#[test]
fn history_store_tests_reset_corrupt_file() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let store = HistoryStore::open(dir.path(), 10).expect("store should open");
    std::fs::write(dir.path().join(HISTORY_FILE_NAME), b"{not json").expect("write should work");

    assert!(store.load().expect("corrupt history should load").is_empty());
    store.append(entry("fresh")).expect("append should succeed");
    assert_eq!(store.load().expect("history should load").len(), 1);
}

#[test]
fn history_store_tests_save_and_resolve_images() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let store = HistoryStore::open(dir.path(), 10).expect("store should open");

    let path = store
        .save_image("req-1.jpg", &[0xFF, 0xD8, 0xFF])
        .expect("image should save");
    assert_eq!(path, store.image_path("req-1.jpg").expect("path should resolve"));
    assert_eq!(std::fs::read(path).expect("image should read"), vec![0xFF, 0xD8, 0xFF]);

    assert!(matches!(
        store.save_image("../escape.jpg", b"x"),
        Err(HistoryError::InvalidFilename(_))
    ));
}

#[test]
fn history_store_tests_reject_zero_limit() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    assert!(matches!(
        HistoryStore::open(dir.path(), 0),
        Err(HistoryError::InvalidLimit)
    ));
}
