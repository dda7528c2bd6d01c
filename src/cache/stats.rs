//! Cache statistics tracking and reporting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Live cache counters, shared between tiers via `Arc`.
#[derive(Debug)]
pub struct CacheStats {
    memory_hits: AtomicU64,
    memory_misses: AtomicU64,
    disk_hits: AtomicU64,
    disk_misses: AtomicU64,
    memory_evictions: AtomicU64,
    disk_evictions: AtomicU64,
    disk_writes: AtomicU64,
    disk_write_failures: AtomicU64,
    created_at: Instant,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStats {
    /// Create a new statistics tracker.
    pub fn new() -> Self {
        Self {
            memory_hits: AtomicU64::new(0),
            memory_misses: AtomicU64::new(0),
            disk_hits: AtomicU64::new(0),
            disk_misses: AtomicU64::new(0),
            memory_evictions: AtomicU64::new(0),
            disk_evictions: AtomicU64::new(0),
            disk_writes: AtomicU64::new(0),
            disk_write_failures: AtomicU64::new(0),
            created_at: Instant::now(),
        }
    }

    /// Record a memory tier hit.
    pub fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a memory tier miss.
    pub fn record_memory_miss(&self) {
        self.memory_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a disk tier hit.
    pub fn record_disk_hit(&self) {
        self.disk_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a disk tier miss.
    pub fn record_disk_miss(&self) {
        self.disk_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record memory tier evictions.
    pub fn record_memory_eviction(&self, count: u64) {
        self.memory_evictions.fetch_add(count, Ordering::Relaxed);
    }

    /// Record disk tier evictions.
    pub fn record_disk_eviction(&self, count: u64) {
        self.disk_evictions.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a successful disk write.
    pub fn record_disk_write(&self) {
        self.disk_writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed disk write.
    pub fn record_disk_write_failure(&self) {
        self.disk_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn memory_hits(&self) -> u64 {
        self.memory_hits.load(Ordering::Relaxed)
    }

    pub fn memory_misses(&self) -> u64 {
        self.memory_misses.load(Ordering::Relaxed)
    }

    pub fn disk_hits(&self) -> u64 {
        self.disk_hits.load(Ordering::Relaxed)
    }

    pub fn disk_misses(&self) -> u64 {
        self.disk_misses.load(Ordering::Relaxed)
    }

    pub fn memory_evictions(&self) -> u64 {
        self.memory_evictions.load(Ordering::Relaxed)
    }

    pub fn disk_evictions(&self) -> u64 {
        self.disk_evictions.load(Ordering::Relaxed)
    }

    pub fn disk_writes(&self) -> u64 {
        self.disk_writes.load(Ordering::Relaxed)
    }

    pub fn disk_write_failures(&self) -> u64 {
        self.disk_write_failures.load(Ordering::Relaxed)
    }

    /// Uptime since the tracker was created.
    pub fn uptime(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}

/// Point-in-time snapshot of cache state for diagnostics and settings UI.
#[derive(Debug, Clone)]
pub struct CacheStatistics {
    pub memory_item_count: usize,
    pub disk_item_count: usize,
    pub memory_size_bytes: u64,
    pub disk_size_bytes: u64,
    pub memory_hits: u64,
    pub memory_misses: u64,
    pub disk_hits: u64,
    pub disk_misses: u64,
    pub memory_evictions: u64,
    pub disk_evictions: u64,
    pub disk_writes: u64,
    pub disk_write_failures: u64,
    pub uptime_secs: u64,
}

impl CacheStatistics {
    /// Memory tier size in megabytes.
    pub fn memory_size_mb(&self) -> f64 {
        self.memory_size_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Disk tier size in megabytes.
    pub fn disk_size_mb(&self) -> f64 {
        self.disk_size_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Memory hit rate (0.0 to 1.0).
    pub fn memory_hit_rate(&self) -> f64 {
        hit_rate(self.memory_hits, self.memory_misses)
    }

    /// Disk hit rate (0.0 to 1.0).
    pub fn disk_hit_rate(&self) -> f64 {
        hit_rate(self.disk_hits, self.disk_misses)
    }

    /// Overall hit rate counting both tiers (0.0 to 1.0).
    pub fn overall_hit_rate(&self) -> f64 {
        hit_rate(self.memory_hits + self.disk_hits, self.disk_misses)
    }

    /// Format statistics as a human-readable string.
    pub fn format(&self) -> String {
        format!(
            r#"Weather Cache Statistics

MEMORY TIER
  Entries:     {}
  Size:        {:.2} MB
  Hits:        {}
  Misses:      {}
  Hit Rate:    {:.1}%
  Evictions:   {}

DISK TIER
  Entries:     {}
  Size:        {:.2} MB
  Hits:        {}
  Misses:      {}
  Hit Rate:    {:.1}%
  Writes:      {}
  Failures:    {}
  Evictions:   {}

OVERALL
  Hit Rate:    {:.1}%
  Uptime:      {}s
"#,
            self.memory_item_count,
            self.memory_size_mb(),
            self.memory_hits,
            self.memory_misses,
            self.memory_hit_rate() * 100.0,
            self.memory_evictions,
            self.disk_item_count,
            self.disk_size_mb(),
            self.disk_hits,
            self.disk_misses,
            self.disk_hit_rate() * 100.0,
            self.disk_writes,
            self.disk_write_failures,
            self.disk_evictions,
            self.overall_hit_rate() * 100.0,
            self.uptime_secs,
        )
    }
}

fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(hits: u64, misses: u64) -> CacheStatistics {
        CacheStatistics {
            memory_item_count: 0,
            disk_item_count: 0,
            memory_size_bytes: 0,
            disk_size_bytes: 0,
            memory_hits: hits,
            memory_misses: misses,
            disk_hits: 0,
            disk_misses: 0,
            memory_evictions: 0,
            disk_evictions: 0,
            disk_writes: 0,
            disk_write_failures: 0,
            uptime_secs: 0,
        }
    }

    #[test]
    fn test_stats_start_at_zero() {
        let stats = CacheStats::new();
        assert_eq!(stats.memory_hits(), 0);
        assert_eq!(stats.disk_misses(), 0);
        assert_eq!(stats.disk_write_failures(), 0);
    }

    #[test]
    fn test_record_counters() {
        let stats = CacheStats::new();
        stats.record_memory_hit();
        stats.record_memory_hit();
        stats.record_memory_miss();
        stats.record_disk_hit();
        stats.record_disk_miss();
        stats.record_disk_write();
        stats.record_disk_write_failure();
        stats.record_memory_eviction(3);
        stats.record_disk_eviction(2);

        assert_eq!(stats.memory_hits(), 2);
        assert_eq!(stats.memory_misses(), 1);
        assert_eq!(stats.disk_hits(), 1);
        assert_eq!(stats.disk_misses(), 1);
        assert_eq!(stats.disk_writes(), 1);
        assert_eq!(stats.disk_write_failures(), 1);
        assert_eq!(stats.memory_evictions(), 3);
        assert_eq!(stats.disk_evictions(), 2);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let snapshot = snapshot_with(0, 0);
        assert_eq!(snapshot.memory_hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let snapshot = snapshot_with(75, 25);
        assert_eq!(snapshot.memory_hit_rate(), 0.75);
    }

    #[test]
    fn test_overall_hit_rate() {
        let mut snapshot = snapshot_with(70, 0);
        snapshot.disk_hits = 20;
        snapshot.disk_misses = 10;
        // 90 hits out of 100 lookups
        assert_eq!(snapshot.overall_hit_rate(), 0.9);
    }

    #[test]
    fn test_size_mb_conversion() {
        let mut snapshot = snapshot_with(0, 0);
        snapshot.memory_size_bytes = 512 * 1024;
        snapshot.disk_size_bytes = 2 * 1024 * 1024;
        assert_eq!(snapshot.memory_size_mb(), 0.5);
        assert_eq!(snapshot.disk_size_mb(), 2.0);
    }

    #[test]
    fn test_format_contains_sections() {
        let mut snapshot = snapshot_with(100, 10);
        snapshot.memory_item_count = 12;
        let formatted = snapshot.format();

        assert!(formatted.contains("MEMORY TIER"));
        assert!(formatted.contains("DISK TIER"));
        assert!(formatted.contains("OVERALL"));
        assert!(formatted.contains("Entries:     12"));
    }

    #[test]
    fn test_uptime_increases() {
        let stats = CacheStats::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(stats.uptime().as_millis() >= 10);
    }
}
