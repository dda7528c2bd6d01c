//! Stratus - two-tier weather forecast cache
//!
//! This library caches Open-Meteo forecast bundles per geographic cell in
//! a bounded memory tier backed by a size-budgeted disk tier, so repeated
//! requests for nearby coordinates are served without network I/O.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a simplified facade:
//!
//! ```ignore
//! use stratus::cache::WeatherCache;
//! use stratus::config::ConfigFile;
//! use stratus::provider::{OpenMeteoProvider, ReqwestClient};
//! use stratus::service::WeatherService;
//!
//! let config = ConfigFile::load()?;
//! let cache = WeatherCache::new(config.cache_config())?;
//! let client = ReqwestClient::with_timeout(config.provider_timeout())?;
//! let provider = OpenMeteoProvider::with_endpoint(client, config.provider.endpoint.clone());
//!
//! let service = WeatherService::new(cache, provider);
//! let bundle = service.conditions(37.7749, -122.4194)?;
//! ```

pub mod cache;
pub mod config;
pub mod coord;
pub mod logging;
pub mod provider;
pub mod service;
pub mod weather;

/// Version of the stratus library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
