//! Crash testing utilities

use std::fs;
use std::path::Path;

use serde_json::Value;

/// Parse `<data_dir>/<key>.json`, if present.
///
/// Panics if the file exists but is not complete JSON: a torn document is
/// exactly what these tests must never observe.
pub fn read_document(data_dir: &Path, key: &str) -> Option<Value> {
    let path = data_dir.join(format!("{}.json", key));
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => panic!("cannot read {}: {}", path.display(), e),
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => panic!(
            "torn document at {}: {}\n{}",
            path.display(),
            e,
            String::from_utf8_lossy(&bytes)
        ),
    }
}

/// Leftover temp files from an aborted write
pub fn temp_files(data_dir: &Path) -> Vec<String> {
    fs::read_dir(data_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .filter(|name| name.ends_with(".tmp"))
                .collect()
        })
        .unwrap_or_default()
}
