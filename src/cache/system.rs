//! Two-tier cache coordinator.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::cache::disk::DiskTier;
use crate::cache::memory::MemoryTier;
use crate::cache::stats::{CacheStatistics, CacheStats};
use crate::cache::types::{CacheConfig, CacheError};
use crate::coord::GeoCell;
use crate::weather::WeatherBundle;

/// Two-tier weather cache coordinating the memory and disk tiers.
///
/// Lookup strategy:
/// 1. Check the memory tier.
/// 2. On miss, check the disk tier and promote the entry into memory
///    when there is room; promotion never evicts.
/// 3. On miss, the caller fetches from the provider and calls [`put`].
///
/// Reads are infallible: any problem inside the cache is reported as a
/// miss. Disk writes are best effort; an entry whose disk write fails is
/// still served from memory until evicted.
///
/// [`put`]: WeatherCache::put
pub struct WeatherCache {
    /// Memory tier (fast, bounded by entry count).
    memory: MemoryTier,
    /// Disk tier (persistent, bounded by size budget).
    disk: DiskTier,
    /// Age from creation after which an entry should be refreshed.
    stale_after: Duration,
    /// Age from creation after which an entry must not be served.
    expire_after: Duration,
    /// Shared statistics.
    stats: Arc<CacheStats>,
}

impl WeatherCache {
    /// Open a cache with the given configuration.
    ///
    /// Creates the cache directory if needed, loads the persisted
    /// metadata index, and sweeps entries that expired while the cache
    /// was closed.
    pub fn new(config: CacheConfig) -> Result<Self, CacheError> {
        let stats = Arc::new(CacheStats::new());

        let memory = MemoryTier::new(
            config.memory_max_items,
            config.expire_after,
            Arc::clone(&stats),
        );
        let disk = DiskTier::new(
            config.directory.clone(),
            config.disk_budget_bytes,
            config.expire_after,
            config.metadata_flush_interval,
            Arc::clone(&stats),
        )?;

        let swept = disk.remove_created_before(Utc::now() - config.expire_after)?;
        if swept > 0 {
            tracing::info!(swept, "removed entries that expired while the cache was closed");
        }

        tracing::info!(
            directory = %config.directory.display(),
            memory_max_items = config.memory_max_items,
            disk_budget_mb = config.disk_budget_bytes / (1024 * 1024),
            disk_entries = disk.entry_count(),
            "weather cache ready"
        );

        Ok(Self {
            memory,
            disk,
            stale_after: config.stale_after,
            expire_after: config.expire_after,
            stats,
        })
    }

    /// Look up the bundle for a geographic cell.
    ///
    /// Returns `None` when no servable entry exists. Never errors; a
    /// corrupt or expired entry is removed and reported as a miss.
    pub fn get(&self, cell: GeoCell) -> Option<WeatherBundle> {
        let key = cell.key();

        if let Some((bundle, _)) = self.memory.get(&key) {
            // Keep the disk copy's LRU position in step with the access
            self.disk.note_access(&key);
            return Some(bundle);
        }

        if let Some((bundle, entry)) = self.disk.get(&key) {
            if self.memory.len() < self.memory.max_items() {
                self.memory
                    .insert(key, bundle.clone(), entry.created_at, entry.size_bytes);
            }
            return Some(bundle);
        }

        None
    }

    /// Store a freshly fetched bundle for a geographic cell.
    ///
    /// The entry is inserted into the memory tier and written to disk.
    /// Entries evicted by the disk tier's budget check are dropped from
    /// the memory tier as well. A failed disk write is logged and
    /// counted but does not fail the call; only serialization errors
    /// propagate.
    pub fn put(&self, cell: GeoCell, bundle: WeatherBundle) -> Result<(), CacheError> {
        let key = cell.key();
        let bytes = serde_json::to_vec(&bundle)?;
        let created_at = Utc::now();

        self.memory
            .insert(key.clone(), bundle, created_at, bytes.len() as u64);

        match self.disk.put(&key, &bytes, created_at) {
            Ok(evicted) => {
                for evicted_key in &evicted {
                    self.memory.remove(evicted_key);
                }
            }
            Err(error) => {
                self.stats.record_disk_write_failure();
                tracing::warn!(key = %key, %error, "disk write failed, entry is memory only");
            }
        }

        Ok(())
    }

    /// Whether the caller should fetch fresh data for a cell.
    ///
    /// True when no entry exists, or when the entry is stale or expired.
    /// A stale entry is still served by [`get`]; this is the signal to
    /// refresh it in the background.
    ///
    /// [`get`]: WeatherCache::get
    pub fn should_refresh(&self, cell: GeoCell) -> bool {
        let key = cell.key();
        let created_at = self
            .memory
            .created_at(&key)
            .or_else(|| self.disk.created_at(&key));

        match created_at {
            None => true,
            Some(created_at) => {
                let now = Utc::now();
                created_at <= now - self.stale_after || created_at <= now - self.expire_after
            }
        }
    }

    /// Remove all expired entries from both tiers.
    ///
    /// Returns the number of entries removed from the disk tier.
    pub fn clear_expired(&self) -> Result<u64, CacheError> {
        let cutoff = Utc::now() - self.expire_after;
        let memory_removed = self.memory.remove_created_before(cutoff);
        let disk_removed = self.disk.remove_created_before(cutoff)?;

        tracing::debug!(memory_removed, disk_removed, "expiry sweep complete");
        Ok(disk_removed)
    }

    /// Point-in-time snapshot of cache state and counters.
    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics {
            memory_item_count: self.memory.len(),
            disk_item_count: self.disk.entry_count(),
            memory_size_bytes: self.memory.size_bytes(),
            disk_size_bytes: self.disk.size_bytes(),
            memory_hits: self.stats.memory_hits(),
            memory_misses: self.stats.memory_misses(),
            disk_hits: self.stats.disk_hits(),
            disk_misses: self.stats.disk_misses(),
            memory_evictions: self.stats.memory_evictions(),
            disk_evictions: self.stats.disk_evictions(),
            disk_writes: self.stats.disk_writes(),
            disk_write_failures: self.stats.disk_write_failures(),
            uptime_secs: self.stats.uptime().as_secs(),
        }
    }
}
