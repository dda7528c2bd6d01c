//! Configuration file handling for ~/.stratus/config.ini.
//!
//! Loads and saves user configuration with sensible defaults. Values not
//! present in the file fall back to `ConfigFile::default()`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::cache::CacheConfig;
use crate::provider::DEFAULT_ENDPOINT;

/// Default HTTP timeout for forecast requests, in seconds.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Cache settings
    pub cache: CacheSettings,
    /// Forecast provider settings
    pub provider: ProviderSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Cache configuration section.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Cache directory path
    pub directory: PathBuf,
    /// Maximum number of forecasts held in memory
    pub memory_items: usize,
    /// Disk usage budget in bytes
    pub disk_size: u64,
    /// Minutes after which a cached forecast is stale
    pub stale_minutes: u64,
    /// Hours after which a cached forecast is discarded
    pub expire_hours: u64,
}

/// Provider configuration section.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Forecast API endpoint
    pub endpoint: String,
    /// HTTP request timeout in seconds
    pub timeout: u64,
}

/// Logging configuration section.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let cache = CacheConfig::default();
        Self {
            cache: CacheSettings {
                directory: cache.directory,
                memory_items: cache.memory_max_items,
                disk_size: cache.disk_budget_bytes,
                stale_minutes: cache.stale_after.as_secs() / 60,
                expire_hours: cache.expire_after.as_secs() / 3600,
            },
            provider: ProviderSettings {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                timeout: DEFAULT_PROVIDER_TIMEOUT_SECS,
            },
            logging: LoggingSettings {
                file: config_directory().join("stratus.log"),
            },
        }
    }
}

impl ConfigFile {
    /// Load configuration from the default path (~/.stratus/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.stratus/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = self.to_config_string();
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }

    /// Translate the `[cache]` section into a [`CacheConfig`].
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.cache.directory.clone())
            .with_memory_max_items(self.cache.memory_items)
            .with_disk_budget(self.cache.disk_size)
            .with_stale_after(Duration::from_secs(self.cache.stale_minutes * 60))
            .with_expire_after(Duration::from_secs(self.cache.expire_hours * 3600))
    }

    /// Provider request timeout as a [`Duration`].
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout)
    }

    /// Serialize to the commented INI representation written to disk.
    fn to_config_string(&self) -> String {
        format!(
            r#"[cache]
; Directory for cached forecasts: one JSON file per location plus metadata.json
; If empty, defaults to the platform cache directory (~/.cache/stratus on Linux)
directory = {directory}
; Maximum number of forecasts held in memory (default: 15)
memory_items = {memory_items}
; Disk usage budget (default: 100MB)
; Supports: KB, MB, GB suffixes (e.g., 50MB, 100MB, 1GB)
disk_size = {disk_size}
; Minutes after which a cached forecast is considered stale and refreshed (default: 15)
stale_minutes = {stale_minutes}
; Hours after which a cached forecast is discarded outright (default: 6)
expire_hours = {expire_hours}

[provider]
; Forecast API endpoint
endpoint = {endpoint}
; Timeout in seconds for HTTP requests (default: 30)
timeout = {timeout}

[logging]
; Log file path
file = {log_file}
"#,
            directory = self.cache.directory.display(),
            memory_items = self.cache.memory_items,
            disk_size = format_size(self.cache.disk_size),
            stale_minutes = self.cache.stale_minutes,
            expire_hours = self.cache.expire_hours,
            endpoint = self.provider.endpoint,
            timeout = self.provider.timeout,
            log_file = self.logging.file.display(),
        )
    }
}

/// Get the path to the config directory (~/.stratus).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".stratus")
}

/// Get the path to the config file (~/.stratus/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in
/// the INI.
fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.cache.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("memory_items") {
            config.cache.memory_items = v.parse().map_err(|_| invalid_value(
                "cache",
                "memory_items",
                v,
                "must be a positive integer",
            ))?;
        }
        if let Some(v) = section.get("disk_size") {
            config.cache.disk_size = parse_size(v).map_err(|_| invalid_value(
                "cache",
                "disk_size",
                v,
                "expected format like '100MB', '1GB', or '1024KB'",
            ))?;
        }
        if let Some(v) = section.get("stale_minutes") {
            config.cache.stale_minutes = v.parse().map_err(|_| invalid_value(
                "cache",
                "stale_minutes",
                v,
                "must be a positive integer (minutes)",
            ))?;
        }
        if let Some(v) = section.get("expire_hours") {
            config.cache.expire_hours = v.parse().map_err(|_| invalid_value(
                "cache",
                "expire_hours",
                v,
                "must be a positive integer (hours)",
            ))?;
        }
    }

    if let Some(section) = ini.section(Some("provider")) {
        if let Some(v) = section.get("endpoint") {
            let v = v.trim();
            if !v.is_empty() {
                config.provider.endpoint = v.to_string();
            }
        }
        if let Some(v) = section.get("timeout") {
            config.provider.timeout = v.parse().map_err(|_| invalid_value(
                "provider",
                "timeout",
                v,
                "must be a positive integer (seconds)",
            ))?;
        }
    }

    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid_value(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected format like '100MB', '1GB', or '1024KB'")]
pub struct SizeParseError {
    input: String,
}

impl SizeParseError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports bare numbers (bytes) and KB/MB/GB suffixes (with or without
/// the trailing B), case-insensitive, whitespace tolerant.
pub fn parse_size(s: &str) -> Result<u64, SizeParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(SizeParseError::new(s));
    }

    let upper = s.to_uppercase();
    let (num_str, multiplier) = if upper.ends_with("GB") || upper.ends_with('G') {
        let suffix_len = if upper.ends_with("GB") { 2 } else { 1 };
        (s[..s.len() - suffix_len].trim(), 1024_u64 * 1024 * 1024)
    } else if upper.ends_with("MB") || upper.ends_with('M') {
        let suffix_len = if upper.ends_with("MB") { 2 } else { 1 };
        (s[..s.len() - suffix_len].trim(), 1024_u64 * 1024)
    } else if upper.ends_with("KB") || upper.ends_with('K') {
        let suffix_len = if upper.ends_with("KB") { 2 } else { 1 };
        (s[..s.len() - suffix_len].trim(), 1024_u64)
    } else {
        (s, 1_u64)
    };

    let num: u64 = num_str.parse().map_err(|_| SizeParseError::new(s))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| SizeParseError::new(s))
}

/// Format a byte count as a human-readable string.
pub fn format_size(bytes: u64) -> String {
    const GB: u64 = 1024 * 1024 * 1024;
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;

    if bytes >= GB && bytes % GB == 0 {
        format!("{}GB", bytes / GB)
    } else if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        format!("{}", bytes)
    }
}

/// Expand ~ to home directory in paths.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.cache.memory_items, 15);
        assert_eq!(config.cache.disk_size, 100 * 1024 * 1024);
        assert_eq!(config.cache.stale_minutes, 15);
        assert_eq!(config.cache.expire_hours, 6);
        assert_eq!(config.provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.provider.timeout, 30);
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();
        let default = ConfigFile::default();

        assert_eq!(config.cache.memory_items, default.cache.memory_items);
        assert_eq!(config.provider.timeout, default.provider.timeout);
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        std::fs::write(
            &config_path,
            r#"
[cache]
memory_items = 30
stale_minutes = 5

[provider]
timeout = 45
"#,
        )
        .unwrap();

        let config = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(config.cache.memory_items, 30);
        assert_eq!(config.cache.stale_minutes, 5);
        assert_eq!(config.provider.timeout, 45);

        // Unspecified values fall back to defaults
        assert_eq!(config.cache.disk_size, 100 * 1024 * 1024);
        assert_eq!(config.cache.expire_hours, 6);
        assert_eq!(config.provider.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_human_readable_sizes() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        std::fs::write(
            &config_path,
            r#"
[cache]
disk_size = 50MB
"#,
        )
        .unwrap();

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(config.cache.disk_size, 50 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_disk_size() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        std::fs::write(
            &config_path,
            r#"
[cache]
disk_size = 2TB
"#,
        )
        .unwrap();

        let result = ConfigFile::load_from(&config_path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("disk_size"));
    }

    #[test]
    fn test_invalid_memory_items() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        std::fs::write(
            &config_path,
            r#"
[cache]
memory_items = lots
"#,
        )
        .unwrap();

        assert!(ConfigFile::load_from(&config_path).is_err());
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.cache.memory_items = 20;
        config.cache.disk_size = 50 * 1024 * 1024;
        config.cache.stale_minutes = 10;
        config.provider.timeout = 15;

        config.save_to(&config_path).unwrap();
        let reloaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(reloaded.cache.memory_items, 20);
        assert_eq!(reloaded.cache.disk_size, 50 * 1024 * 1024);
        assert_eq!(reloaded.cache.stale_minutes, 10);
        assert_eq!(reloaded.provider.timeout, 15);
    }

    #[test]
    fn test_cache_config_translation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        std::fs::write(
            &config_path,
            r#"
[cache]
directory = /var/cache/wx
memory_items = 8
disk_size = 10MB
stale_minutes = 30
expire_hours = 12
"#,
        )
        .unwrap();

        let cache = ConfigFile::load_from(&config_path).unwrap().cache_config();

        assert_eq!(cache.directory, PathBuf::from("/var/cache/wx"));
        assert_eq!(cache.memory_max_items, 8);
        assert_eq!(cache.disk_budget_bytes, 10 * 1024 * 1024);
        assert_eq!(cache.stale_after, Duration::from_secs(30 * 60));
        assert_eq!(cache.expire_after, Duration::from_secs(12 * 3600));
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/wx/cache");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path, home.join("wx/cache"));
        }

        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("100MB").unwrap(), 100 * 1024 * 1024);
        assert_eq!(parse_size("2gb").unwrap(), 2 * 1024 * 1024 * 1024);
        assert_eq!(parse_size(" 500 MB ").unwrap(), 500 * 1024 * 1024);

        assert!(parse_size("").is_err());
        assert!(parse_size("abc").is_err());
        assert!(parse_size("1.5GB").is_err());
        assert!(parse_size("-1GB").is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(1024), "1KB");
        assert_eq!(format_size(100 * 1024 * 1024), "100MB");
        assert_eq!(format_size(2 * 1024 * 1024 * 1024), "2GB");
        assert_eq!(format_size(1000), "1000");
    }
}
