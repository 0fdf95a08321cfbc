//! Document write crash scenarios
//!
//! - Crash before the replace → previous document intact
//! - Crash after the replace → new document complete
//! - Never a torn document

use serde_json::json;
use tempfile::TempDir;

use crate::crash::harness::{report_failure, write_doc_with_crash_point};
use crate::crash::utils::{read_document, temp_files};
use scriptorium::crash_point::points;
use scriptorium::store::{DocumentStore, FileDocumentStore};

fn seeded_dir() -> (TempDir, serde_json::Value) {
    let temp_dir = TempDir::new().unwrap();
    let old = json!({"p1": [{"id": "00000000-0000-0000-0000-000000000001", "content": "old"}]});
    let store = FileDocumentStore::open(temp_dir.path()).unwrap();
    store.write("comments", &old).unwrap();
    (temp_dir, old)
}

fn new_document() -> String {
    // large enough that the mid-write crash leaves a partial temp file
    let comments: Vec<_> = (0..200)
        .map(|i| json!({"id": format!("c{}", i), "content": "x".repeat(64)}))
        .collect();
    json!({ "p1": comments }).to_string()
}

fn assert_crashed(point: &str, result: &crate::crash::harness::CrashTestResult) {
    if !result.crashed {
        report_failure(point, "process aborted at crash point", result);
    }
    assert!(result.crashed, "expected crash at {}", point);
}

#[test]
fn test_crash_mid_temp_write_keeps_previous_document() {
    let (temp_dir, old) = seeded_dir();

    let result = write_doc_with_crash_point(
        Some(points::STORE_MID_TEMP_WRITE),
        temp_dir.path(),
        "comments",
        &new_document(),
    );
    assert_crashed(points::STORE_MID_TEMP_WRITE, &result);

    assert_eq!(read_document(temp_dir.path(), "comments"), Some(old.clone()));

    // the store ignores the stray temp file
    let store = FileDocumentStore::open(temp_dir.path()).unwrap();
    assert_eq!(store.read("comments", json!({})), old);
}

#[test]
fn test_crash_before_persist_keeps_previous_document() {
    let (temp_dir, old) = seeded_dir();

    let result = write_doc_with_crash_point(
        Some(points::STORE_BEFORE_PERSIST),
        temp_dir.path(),
        "comments",
        &new_document(),
    );
    assert_crashed(points::STORE_BEFORE_PERSIST, &result);

    assert_eq!(read_document(temp_dir.path(), "comments"), Some(old));
    assert!(!temp_files(temp_dir.path()).is_empty());
}

#[test]
fn test_crash_after_persist_has_new_document() {
    let (temp_dir, _) = seeded_dir();
    let new = new_document();

    let result = write_doc_with_crash_point(
        Some(points::STORE_AFTER_PERSIST),
        temp_dir.path(),
        "comments",
        &new,
    );
    assert_crashed(points::STORE_AFTER_PERSIST, &result);

    let expected: serde_json::Value = serde_json::from_str(&new).unwrap();
    assert_eq!(read_document(temp_dir.path(), "comments"), Some(expected));
    assert!(temp_files(temp_dir.path()).is_empty());
}

#[test]
fn test_crash_on_first_write_leaves_no_document() {
    let temp_dir = TempDir::new().unwrap();

    let result = write_doc_with_crash_point(
        Some(points::STORE_BEFORE_PERSIST),
        temp_dir.path(),
        "permissions",
        r#"{"alice": "admin"}"#,
    );
    assert_crashed(points::STORE_BEFORE_PERSIST, &result);

    assert_eq!(read_document(temp_dir.path(), "permissions"), None);
    let store = FileDocumentStore::open(temp_dir.path()).unwrap();
    assert_eq!(store.read("permissions", json!({})), json!({}));
}

#[test]
fn test_write_after_crash_succeeds() {
    let (temp_dir, _) = seeded_dir();

    let crashed = write_doc_with_crash_point(
        Some(points::STORE_MID_TEMP_WRITE),
        temp_dir.path(),
        "comments",
        &new_document(),
    );
    assert_crashed(points::STORE_MID_TEMP_WRITE, &crashed);

    let result = write_doc_with_crash_point(None, temp_dir.path(), "comments", r#"{"p2": []}"#);
    if result.crashed {
        report_failure("none", "clean exit", &result);
    }
    assert!(!result.crashed);
    assert_eq!(read_document(temp_dir.path(), "comments"), Some(json!({"p2": []})));
}
