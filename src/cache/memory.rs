//! In-memory cache tier with LRU eviction.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::cache::stats::CacheStats;
use crate::weather::WeatherBundle;

/// Entry in the memory tier.
#[derive(Debug, Clone)]
struct MemoryEntry {
    /// Cached payload
    bundle: WeatherBundle,
    /// Creation time, used for staleness and expiry checks
    created_at: DateTime<Utc>,
    /// Serialized payload size in bytes
    size_bytes: u64,
    /// Last access time for LRU eviction
    last_accessed: Instant,
    /// Number of times accessed
    access_count: u64,
}

impl MemoryEntry {
    fn new(bundle: WeatherBundle, created_at: DateTime<Utc>, size_bytes: u64) -> Self {
        Self {
            bundle,
            created_at,
            size_bytes,
            last_accessed: Instant::now(),
            access_count: 0,
        }
    }

    /// Update access time and increment access count.
    fn touch(&mut self) {
        self.last_accessed = Instant::now();
        self.access_count += 1;
    }
}

/// Bounded in-memory tier holding the most recently used weather bundles.
///
/// Capacity is counted in entries, not bytes. When a new key arrives at
/// capacity, the entry with the oldest access time is evicted.
pub struct MemoryTier {
    /// Map from cache key to entry.
    entries: DashMap<String, MemoryEntry>,
    /// Maximum number of resident entries.
    max_items: usize,
    /// Age from creation after which an entry must not be served.
    expire_after: Duration,
    /// Total serialized size of all resident entries.
    total_size: AtomicU64,
    /// Shared statistics.
    stats: Arc<CacheStats>,
}

impl MemoryTier {
    /// Create a new memory tier with the given entry cap.
    pub fn new(max_items: usize, expire_after: Duration, stats: Arc<CacheStats>) -> Self {
        Self {
            entries: DashMap::new(),
            max_items,
            expire_after,
            total_size: AtomicU64::new(0),
            stats,
        }
    }

    /// Get a cached bundle along with its creation time.
    ///
    /// Updates the entry's access time on hit. An entry past its expiry
    /// age is removed and reported as a miss. Records a hit or a miss
    /// against the shared statistics.
    pub fn get(&self, key: &str) -> Option<(WeatherBundle, DateTime<Utc>)> {
        let expired = match self.entries.get_mut(key) {
            Some(mut entry) => {
                if entry.created_at <= Utc::now() - self.expire_after {
                    true
                } else {
                    entry.touch();
                    self.stats.record_memory_hit();
                    return Some((entry.bundle.clone(), entry.created_at));
                }
            }
            None => {
                self.stats.record_memory_miss();
                return None;
            }
        };

        // The shard guard is released once the match above ends, so the
        // removal below cannot deadlock against it.
        if expired {
            self.remove(key);
            tracing::debug!(key = %key, "memory tier dropped expired entry");
        }
        self.stats.record_memory_miss();
        None
    }

    /// Creation time of a resident entry without touching its access
    /// time or recording statistics.
    pub fn created_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.get(key).map(|entry| entry.created_at)
    }

    /// Insert a bundle, evicting the least recently used entry if the
    /// tier is at capacity and the key is new.
    pub fn insert(
        &self,
        key: String,
        bundle: WeatherBundle,
        created_at: DateTime<Utc>,
        size_bytes: u64,
    ) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_items {
            self.evict_lru();
        }

        let entry = MemoryEntry::new(bundle, created_at, size_bytes);
        if let Some(old) = self.entries.insert(key, entry) {
            // Replacing an existing entry, adjust the size delta
            if size_bytes > old.size_bytes {
                self.total_size
                    .fetch_add(size_bytes - old.size_bytes, Ordering::Relaxed);
            } else {
                self.total_size
                    .fetch_sub(old.size_bytes - size_bytes, Ordering::Relaxed);
            }
        } else {
            self.total_size.fetch_add(size_bytes, Ordering::Relaxed);
        }
    }

    /// Remove an entry. Returns `true` if the key was resident.
    pub fn remove(&self, key: &str) -> bool {
        if let Some((_, entry)) = self.entries.remove(key) {
            self.total_size
                .fetch_sub(entry.size_bytes, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Check if a key is resident without touching its access time.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Current number of resident entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tier is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total serialized size of resident entries in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.total_size.load(Ordering::Relaxed)
    }

    /// Maximum number of resident entries.
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Remove all entries created at or before `cutoff`.
    ///
    /// Returns the number of entries removed.
    pub fn remove_created_before(&self, cutoff: DateTime<Utc>) -> u64 {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value().created_at <= cutoff)
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for key in expired {
            if self.remove(&key) {
                removed += 1;
            }
        }
        removed
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.entries.clear();
        self.total_size.store(0, Ordering::Relaxed);
    }

    /// Evict the entry with the oldest access time.
    fn evict_lru(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().last_accessed)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            if self.remove(&key) {
                self.stats.record_memory_eviction(1);
                tracing::debug!(key = %key, "memory tier evicted LRU entry");
            }
        }
    }
}
