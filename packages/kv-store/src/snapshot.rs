//! Whole-keyspace snapshots for `MemoryStore`.
//!
//! A snapshot is a JSON document listing every entry in key order, with keys
//! and values base64-encoded since both are arbitrary bytes.

use std::fs;
use std::io::Write;
use std::path::Path;

use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{KvError, MemoryStore};

/// Format version written into every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    entries: Vec<SnapshotEntry>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotEntry {
    key: String,
    value: String,
}

fn encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn decode(field: &str, text: &str) -> Result<Bytes, KvError> {
    base64::engine::general_purpose::STANDARD
        .decode(text)
        .map(Bytes::from)
        .map_err(|e| KvError::Snapshot {
            message: format!("invalid base64 in {}: {}", field, e),
        })
}

impl MemoryStore {
    /// Write every entry to `path`, replacing any existing file atomically.
    ///
    /// Returns the number of entries written.
    pub fn save_snapshot(&self, path: &Path) -> Result<usize, KvError> {
        let snapshot = SnapshotFile {
            version: SNAPSHOT_VERSION,
            entries: self
                .entries()?
                .iter()
                .map(|(k, v)| SnapshotEntry {
                    key: encode(k),
                    value: encode(v),
                })
                .collect(),
        };
        let count = snapshot.entries.len();

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut file, &snapshot)?;
        file.flush()?;
        file.persist(path).map_err(|e| KvError::from(e.error))?;

        log::debug!("Wrote snapshot of {} entries to {}", count, path.display());
        Ok(count)
    }

    /// Open a new store holding the entries of the snapshot at `path`.
    pub fn load_snapshot(path: &Path) -> Result<MemoryStore, KvError> {
        let store = MemoryStore::new();
        store.restore_snapshot(path)?;
        Ok(store)
    }

    /// Replace this store's keyspace with the snapshot at `path`.
    ///
    /// Returns the number of entries loaded.
    pub fn restore_snapshot(&self, path: &Path) -> Result<usize, KvError> {
        log::debug!("Reading snapshot {}...", path.display());
        let text = fs::read_to_string(path)?;
        let snapshot: SnapshotFile = serde_json::from_str(&text)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(KvError::Snapshot {
                message: format!(
                    "unsupported snapshot version {} (expected {})",
                    snapshot.version, SNAPSHOT_VERSION
                ),
            });
        }

        let mut entries = Vec::with_capacity(snapshot.entries.len());
        for entry in &snapshot.entries {
            entries.push((decode("key", &entry.key)?, decode("value", &entry.value)?));
        }

        let count = entries.len();
        let mut inner = self.lock()?;
        inner.map.clear();
        inner.map.extend(entries);
        Ok(count)
    }
}
