//! File-backed document store.
//!
//! Each document lives in `<data_dir>/<key>.json`.
//!
//! Atomicity is achieved via:
//! 1. Write the full document to a fresh temp file in `data_dir`
//! 2. fsync the temp file (durability)
//! 3. Rename temp over the target (atomic on POSIX)
//! 4. fsync the directory so the rename itself is durable
//!
//! An interrupted write leaves at most an abandoned `.<key>.*.tmp` file;
//! readers only ever open the target path.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tempfile::Builder;
use tracing::{debug, error, warn};

use super::document::{validate_key, DocumentStore};
use super::errors::{StoreError, StoreResult};
use super::lock_table::LockTable;
use crate::crash_point::{maybe_crash, points};

/// Durable JSON document store rooted at a data directory.
#[derive(Debug)]
pub struct FileDocumentStore {
    data_dir: PathBuf,
    locks: LockTable,
}

impl FileDocumentStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    pub fn open(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|e| {
            StoreError::unavailable(
                "",
                format!("failed to create data directory {}: {}", data_dir.display(), e),
            )
        })?;

        Ok(Self {
            data_dir,
            locks: LockTable::new(),
        })
    }

    /// Root directory of this store
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the committed file for `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }

    fn read_unlocked(&self, key: &str, default: Value) -> Value {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return default,
            Err(e) => {
                warn!(key, path = %path.display(), error = %e, "document unreadable, using default");
                return default;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, path = %path.display(), error = %e, "document corrupt, reset to default");
                default
            }
        }
    }

    fn write_unlocked(&self, key: &str, value: &Value) -> StoreResult<()> {
        let bytes = encode_pretty(value).map_err(|e| StoreError::Serialization {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let result = self.commit(key, &bytes);
        match &result {
            Ok(()) => debug!(key, bytes = bytes.len(), "document committed"),
            Err(e) => error!(key, error = %e, "document write failed, previous version kept"),
        }
        result
    }

    fn commit(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        // Dropping `temp` on any early return deletes the temp file.
        let mut temp = Builder::new()
            .prefix(&format!(".{}.", key))
            .suffix(".tmp")
            .tempfile_in(&self.data_dir)
            .map_err(|e| StoreError::unavailable(key, format!("failed to create temp file: {}", e)))?;

        let (head, tail) = bytes.split_at(bytes.len() / 2);
        temp.write_all(head)
            .map_err(|e| StoreError::unavailable(key, format!("failed to write temp file: {}", e)))?;
        maybe_crash(points::STORE_MID_TEMP_WRITE);
        temp.write_all(tail)
            .map_err(|e| StoreError::unavailable(key, format!("failed to write temp file: {}", e)))?;

        temp.as_file()
            .sync_all()
            .map_err(|e| StoreError::unavailable(key, format!("failed to fsync temp file: {}", e)))?;

        maybe_crash(points::STORE_BEFORE_PERSIST);

        temp.persist(self.path_for(key))
            .map_err(|e| StoreError::unavailable(key, format!("failed to replace document: {}", e.error)))?;

        maybe_crash(points::STORE_AFTER_PERSIST);

        if let Err(e) = sync_dir(&self.data_dir) {
            warn!(key, dir = %self.data_dir.display(), error = %e, "directory fsync failed after replace");
        }

        Ok(())
    }
}

/// Flush directory entries so the rename survives power loss.
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

/// Pretty JSON with 4-space indentation.
fn encode_pretty(value: &Value) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(256);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(buf)
}

impl DocumentStore for FileDocumentStore {
    fn read(&self, key: &str, default: Value) -> Value {
        if let Err(e) = validate_key(key) {
            warn!(error = %e, "read of invalid key, using default");
            return default;
        }
        self.locks.with_lock(key, || self.read_unlocked(key, default))
    }

    fn write(&self, key: &str, value: &Value) -> StoreResult<()> {
        validate_key(key)?;
        self.locks.with_lock(key, || self.write_unlocked(key, value))
    }

    fn update(
        &self,
        key: &str,
        default: Value,
        mutate: &mut dyn FnMut(&mut Value) -> bool,
    ) -> StoreResult<bool> {
        validate_key(key)?;
        self.locks.with_lock(key, || {
            let mut value = self.read_unlocked(key, default);
            if !mutate(&mut value) {
                return Ok(false);
            }
            self.write_unlocked(key, &value).map(|()| true)
        })
    }
}
