//! Shared cache types and configuration.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::coord::CoordError;

/// Default maximum number of entries held in memory.
pub const DEFAULT_MEMORY_MAX_ITEMS: usize = 15;

/// Default disk budget in bytes (100 MB).
pub const DEFAULT_DISK_BUDGET_BYTES: u64 = 100 * 1024 * 1024;

/// Default age after which an entry is stale and should be refreshed.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(15 * 60);

/// Default age after which an entry must no longer be served.
pub const DEFAULT_EXPIRE_AFTER: Duration = Duration::from_secs(6 * 60 * 60);

/// Default number of accesses between metadata persists.
pub const DEFAULT_METADATA_FLUSH_INTERVAL: u64 = 10;

/// Errors that can occur inside the cache.
///
/// These never escape the read path; `get` reports a miss instead.
/// The constructor and internal helpers propagate them normally.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem operation failed
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload or metadata (de)serialization failed
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Coordinates outside the valid geographic range
    #[error("Invalid cache coordinate: {0}")]
    InvalidCoordinate(#[from] CoordError),
}

/// Configuration for the two-tier weather cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding per-key payload files and `metadata.json`.
    pub directory: PathBuf,

    /// Maximum number of entries resident in memory.
    pub memory_max_items: usize,

    /// Disk budget in bytes. Eviction trims to 80% of this once exceeded.
    pub disk_budget_bytes: u64,

    /// Age from creation after which an entry is stale (still servable,
    /// but a caller should refresh).
    pub stale_after: Duration,

    /// Age from creation after which an entry must not be served.
    pub expire_after: Duration,

    /// Number of read accesses between synchronous metadata persists.
    /// Writes always persist immediately.
    pub metadata_flush_interval: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: default_cache_directory(),
            memory_max_items: DEFAULT_MEMORY_MAX_ITEMS,
            disk_budget_bytes: DEFAULT_DISK_BUDGET_BYTES,
            stale_after: DEFAULT_STALE_AFTER,
            expire_after: DEFAULT_EXPIRE_AFTER,
            metadata_flush_interval: DEFAULT_METADATA_FLUSH_INTERVAL,
        }
    }
}

impl CacheConfig {
    /// Create a configuration rooted at the given directory with defaults
    /// for everything else.
    pub fn new(directory: PathBuf) -> Self {
        Self {
            directory,
            ..Self::default()
        }
    }

    /// Set the memory item cap.
    pub fn with_memory_max_items(mut self, items: usize) -> Self {
        self.memory_max_items = items;
        self
    }

    /// Set the disk budget in bytes.
    pub fn with_disk_budget(mut self, bytes: u64) -> Self {
        self.disk_budget_bytes = bytes;
        self
    }

    /// Set the staleness threshold.
    pub fn with_stale_after(mut self, age: Duration) -> Self {
        self.stale_after = age;
        self
    }

    /// Set the expiry threshold.
    pub fn with_expire_after(mut self, age: Duration) -> Self {
        self.expire_after = age;
        self
    }

    /// Set the number of accesses between metadata persists.
    pub fn with_metadata_flush_interval(mut self, accesses: u64) -> Self {
        self.metadata_flush_interval = accesses;
        self
    }
}

/// Default cache directory under the platform cache dir.
fn default_cache_directory() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stratus")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.memory_max_items, 15);
        assert_eq!(config.disk_budget_bytes, 100 * 1024 * 1024);
        assert_eq!(config.stale_after, Duration::from_secs(900));
        assert_eq!(config.expire_after, Duration::from_secs(21_600));
        assert_eq!(config.metadata_flush_interval, 10);
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::new(PathBuf::from("/tmp/wx"))
            .with_memory_max_items(5)
            .with_disk_budget(1024)
            .with_stale_after(Duration::from_millis(50))
            .with_expire_after(Duration::from_millis(200))
            .with_metadata_flush_interval(3);

        assert_eq!(config.directory, PathBuf::from("/tmp/wx"));
        assert_eq!(config.memory_max_items, 5);
        assert_eq!(config.disk_budget_bytes, 1024);
        assert_eq!(config.stale_after, Duration::from_millis(50));
        assert_eq!(config.expire_after, Duration::from_millis(200));
        assert_eq!(config.metadata_flush_interval, 3);
    }

    #[test]
    fn test_cache_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: CacheError = io.into();
        assert!(err.to_string().contains("disk full"));
    }
}
