//! Disk cache tier with a size budget and LRU eviction.
//!
//! Payloads are stored one JSON file per cache key. Entry bookkeeping
//! lives in the [`MetadataStore`]; payload files without an index entry
//! are tolerated but never served.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::metadata::{EntryMetadata, MetadataStore};
use crate::cache::stats::CacheStats;
use crate::cache::types::CacheError;
use crate::weather::WeatherBundle;

/// Fraction of the budget the tier trims down to once the budget is
/// exceeded, so back-to-back writes do not each trigger an eviction pass.
const EVICTION_TARGET_RATIO: f64 = 0.8;

/// Disk tier for persistent storage of weather bundles.
pub struct DiskTier {
    /// Directory holding payload files and the metadata index.
    directory: PathBuf,
    /// Size budget in bytes.
    budget_bytes: u64,
    /// Age from creation after which an entry must not be served.
    expire_after: Duration,
    /// Persisted entry index.
    metadata: MetadataStore,
    /// Shared statistics.
    stats: Arc<CacheStats>,
}

impl DiskTier {
    /// Open the disk tier rooted at `directory`, creating it if needed.
    pub fn new(
        directory: PathBuf,
        budget_bytes: u64,
        expire_after: Duration,
        metadata_flush_interval: u64,
        stats: Arc<CacheStats>,
    ) -> Result<Self, CacheError> {
        if !directory.exists() {
            fs::create_dir_all(&directory)?;
        }

        let metadata = MetadataStore::open(&directory, metadata_flush_interval)?;

        Ok(Self {
            directory,
            budget_bytes,
            expire_after,
            metadata,
            stats,
        })
    }

    /// Get a cached bundle along with its index entry.
    ///
    /// An entry past its expiry age is removed and reported as a miss,
    /// as is a payload that is missing or fails to deserialize; read
    /// problems never surface as errors.
    pub fn get(&self, key: &str) -> Option<(WeatherBundle, EntryMetadata)> {
        let Some(entry) = self.metadata.get(key) else {
            self.stats.record_disk_miss();
            return None;
        };

        if entry.created_at <= Utc::now() - self.expire_after {
            tracing::debug!(key = %key, "disk tier dropped expired entry");
            self.delete_entry(key);
            if let Err(error) = self.metadata.persist() {
                tracing::warn!(%error, "failed to persist cache metadata after dropping entry");
            }
            self.stats.record_disk_miss();
            return None;
        }

        let path = self.payload_path(key);
        match fs::read(&path).map_err(CacheError::from).and_then(|bytes| {
            serde_json::from_slice::<WeatherBundle>(&bytes).map_err(CacheError::from)
        }) {
            Ok(bundle) => {
                self.stats.record_disk_hit();
                self.metadata.record_access(key);
                Some((bundle, entry))
            }
            Err(error) => {
                tracing::warn!(
                    key = %key,
                    %error,
                    "dropping unreadable cache payload"
                );
                self.delete_entry(key);
                if let Err(error) = self.metadata.persist() {
                    tracing::warn!(%error, "failed to persist cache metadata after dropping entry");
                }
                self.stats.record_disk_miss();
                None
            }
        }
    }

    /// Record a read access against an indexed entry without reading the
    /// payload. Used when a lookup is served by the memory tier, so disk
    /// LRU ordering still reflects the access.
    pub fn note_access(&self, key: &str) {
        self.metadata.record_access(key);
    }

    /// Creation time of an indexed entry without touching its access
    /// time or recording statistics.
    pub fn created_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.metadata.get(key).map(|entry| entry.created_at)
    }

    /// Write a serialized bundle to disk and persist its metadata.
    ///
    /// Runs a budget check afterwards, trimming least recently used
    /// entries if the tier has grown past its budget. Returns the keys
    /// of any evicted entries so the caller can drop its own copies.
    pub fn put(
        &self,
        key: &str,
        bytes: &[u8],
        created_at: DateTime<Utc>,
    ) -> Result<Vec<String>, CacheError> {
        let path = self.payload_path(key);
        fs::write(&path, bytes)?;

        self.metadata
            .upsert(key, EntryMetadata::new(created_at, bytes.len() as u64))?;
        self.stats.record_disk_write();

        self.enforce_budget()
    }

    /// Remove an entry's payload and metadata. Returns `true` if the key
    /// was indexed.
    pub fn remove(&self, key: &str) -> bool {
        if self.metadata.get(key).is_none() {
            return false;
        }
        self.delete_entry(key);
        if let Err(error) = self.metadata.persist() {
            tracing::warn!(%error, "failed to persist cache metadata after removal");
        }
        true
    }

    /// Check if a key is indexed without touching its access time.
    pub fn contains(&self, key: &str) -> bool {
        self.metadata.contains(key)
    }

    /// Number of indexed entries.
    pub fn entry_count(&self) -> usize {
        self.metadata.len()
    }

    /// Total indexed payload size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.metadata.total_size_bytes()
    }

    /// Size budget in bytes.
    pub fn budget_bytes(&self) -> u64 {
        self.budget_bytes
    }

    /// Remove all entries created at or before `cutoff`.
    ///
    /// Returns the number of entries removed. The index is persisted once
    /// after the sweep.
    pub fn remove_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64, CacheError> {
        let expired = self.metadata.keys_created_before(cutoff);
        if expired.is_empty() {
            return Ok(0);
        }

        let mut removed = 0;
        for key in &expired {
            self.delete_entry(key);
            removed += 1;
        }
        self.metadata.persist()?;

        tracing::info!(removed, "disk tier expiry sweep complete");
        Ok(removed)
    }

    /// Trim least recently used entries until the tier is at or under
    /// the eviction target, if the budget is currently exceeded.
    ///
    /// Returns the keys of the evicted entries.
    fn enforce_budget(&self) -> Result<Vec<String>, CacheError> {
        let mut current_size = self.metadata.total_size_bytes();
        if current_size <= self.budget_bytes {
            return Ok(Vec::new());
        }

        let target_size = (self.budget_bytes as f64 * EVICTION_TARGET_RATIO) as u64;
        let entries = self.metadata.entries_oldest_first();

        let mut evicted = Vec::new();
        let mut freed_bytes = 0;
        for (key, entry) in entries {
            if current_size <= target_size {
                break;
            }
            self.delete_entry(&key);
            current_size = current_size.saturating_sub(entry.size_bytes);
            freed_bytes += entry.size_bytes;
            evicted.push(key);
        }

        self.metadata.persist()?;
        self.stats.record_disk_eviction(evicted.len() as u64);

        tracing::info!(
            evicted = evicted.len(),
            freed_kb = freed_bytes / 1024,
            size_kb = current_size / 1024,
            "disk tier eviction complete"
        );
        Ok(evicted)
    }

    /// Drop one entry's payload file and index entry. File removal is
    /// best effort; a leftover payload without an index entry is never
    /// served.
    fn delete_entry(&self, key: &str) {
        let _ = fs::remove_file(self.payload_path(key));
        self.metadata.remove(key);
    }

    fn payload_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.json"))
    }
}
