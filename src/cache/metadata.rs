//! Persisted metadata index for the disk tier.
//!
//! All entry metadata lives in a single `metadata.json` file next to the
//! payload files. Writes persist the index immediately; read accesses
//! batch persistence to every Nth access to keep the read path cheap.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::cache::types::CacheError;

/// Name of the aggregate metadata file inside the cache directory.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Metadata for one disk tier entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// When the payload was stored.
    pub created_at: DateTime<Utc>,
    /// Last read access, used for LRU ordering during eviction.
    pub last_accessed: DateTime<Utc>,
    /// Number of read accesses.
    pub access_count: u64,
    /// Serialized payload size in bytes.
    pub size_bytes: u64,
}

impl EntryMetadata {
    /// Create metadata for a freshly written entry.
    pub fn new(created_at: DateTime<Utc>, size_bytes: u64) -> Self {
        Self {
            created_at,
            last_accessed: created_at,
            access_count: 0,
            size_bytes,
        }
    }
}

/// Index of disk entries, persisted as a single JSON document.
pub struct MetadataStore {
    /// Path of the `metadata.json` file.
    path: PathBuf,
    /// Entries keyed by cache key. BTreeMap keeps the persisted form stable.
    entries: Mutex<BTreeMap<String, EntryMetadata>>,
    /// Read accesses since the store was opened.
    access_counter: AtomicU64,
    /// Persist after every Nth read access.
    flush_interval: u64,
}

impl MetadataStore {
    /// Open the index inside `directory`, loading `metadata.json` if present.
    ///
    /// A missing file yields an empty index. A file that fails to parse is
    /// discarded and the index starts empty; payload files on disk without
    /// an index entry are simply never served again.
    pub fn open(directory: &Path, flush_interval: u64) -> Result<Self, CacheError> {
        let path = directory.join(METADATA_FILE_NAME);
        let entries = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<BTreeMap<String, EntryMetadata>>(&bytes) {
                Ok(entries) => entries,
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        %error,
                        "discarding unreadable cache metadata, starting with an empty index"
                    );
                    BTreeMap::new()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => return Err(error.into()),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
            access_counter: AtomicU64::new(0),
            flush_interval: flush_interval.max(1),
        })
    }

    /// Get a copy of the metadata for `key`.
    pub fn get(&self, key: &str) -> Option<EntryMetadata> {
        self.entries.lock().get(key).cloned()
    }

    /// Check if the index knows `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Insert or replace the metadata for `key` and persist immediately.
    pub fn upsert(&self, key: &str, metadata: EntryMetadata) -> Result<(), CacheError> {
        {
            let mut entries = self.entries.lock();
            entries.insert(key.to_string(), metadata);
        }
        self.persist()
    }

    /// Record a read access against `key`.
    ///
    /// Updates the entry's access time and count, then persists the index
    /// when the batched access counter reaches the flush interval. Persist
    /// failures are logged and swallowed so reads stay infallible.
    pub fn record_access(&self, key: &str) {
        {
            let mut entries = self.entries.lock();
            if let Some(entry) = entries.get_mut(key) {
                entry.last_accessed = Utc::now();
                entry.access_count += 1;
            }
        }

        let accesses = self.access_counter.fetch_add(1, Ordering::Relaxed) + 1;
        if accesses % self.flush_interval == 0 {
            if let Err(error) = self.persist() {
                tracing::warn!(%error, "failed to persist cache metadata after batched accesses");
            }
        }
    }

    /// Remove the metadata for `key`.
    ///
    /// Does not persist; callers batching removals call [`persist`] once
    /// at the end.
    ///
    /// [`persist`]: MetadataStore::persist
    pub fn remove(&self, key: &str) -> Option<EntryMetadata> {
        self.entries.lock().remove(key)
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Total payload size across all indexed entries.
    pub fn total_size_bytes(&self) -> u64 {
        self.entries.lock().values().map(|e| e.size_bytes).sum()
    }

    /// All entries ordered by last access time, oldest first.
    pub fn entries_oldest_first(&self) -> Vec<(String, EntryMetadata)> {
        let mut entries: Vec<(String, EntryMetadata)> = self
            .entries
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by_key(|(_, metadata)| metadata.last_accessed);
        entries
    }

    /// Keys of entries created at or before `cutoff`.
    pub fn keys_created_before(&self, cutoff: DateTime<Utc>) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(_, metadata)| metadata.created_at <= cutoff)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Write the index to `metadata.json`.
    pub fn persist(&self) -> Result<(), CacheError> {
        let bytes = {
            let entries = self.entries.lock();
            serde_json::to_vec_pretty(&*entries)?
        };
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}
