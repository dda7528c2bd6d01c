//! Weather fetch service combining the cache with a forecast provider.
//!
//! `WeatherService` is the decision layer above [`WeatherCache`]: it asks
//! the cache whether a cell needs refreshing, hits the provider only when
//! it does, and falls back to a still-servable cached bundle when the
//! network is unavailable.

use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{CacheError, CacheStatistics, WeatherCache};
use crate::coord::{CoordError, GeoCell};
use crate::provider::{ProviderError, WeatherProvider};
use crate::weather::WeatherBundle;

/// Errors surfaced by the fetch service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Requested coordinates are outside the valid range
    #[error(transparent)]
    Coordinate(#[from] CoordError),

    /// The provider failed and no cached bundle was servable
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Cache construction or write-path serialization failed
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Serves weather bundles, preferring cache over network.
pub struct WeatherService<P: WeatherProvider> {
    cache: WeatherCache,
    provider: P,
}

impl<P: WeatherProvider> WeatherService<P> {
    /// Creates a service over an existing cache and provider.
    pub fn new(cache: WeatherCache, provider: P) -> Self {
        Self { cache, provider }
    }

    /// Returns the current weather bundle for the given coordinates.
    ///
    /// Fresh cache entries are served without network I/O. Stale or
    /// missing entries trigger a provider fetch whose result is written
    /// back to the cache. If the fetch fails but a stale (not yet
    /// expired) bundle is still cached, that bundle is served instead
    /// of surfacing the error.
    pub fn conditions(&self, latitude: f64, longitude: f64) -> Result<WeatherBundle, ServiceError> {
        let cell = GeoCell::from_degrees(latitude, longitude)?;

        if !self.cache.should_refresh(cell) {
            if let Some(bundle) = self.cache.get(cell) {
                return Ok(bundle);
            }
        }

        match self.provider.fetch(cell) {
            Ok(bundle) => {
                self.cache.put(cell, bundle.clone())?;
                debug!(key = %cell.key(), provider = self.provider.name(), "forecast refreshed");
                Ok(bundle)
            }
            Err(err) => {
                if let Some(bundle) = self.cache.get(cell) {
                    warn!(
                        key = %cell.key(),
                        provider = self.provider.name(),
                        error = %err,
                        "forecast fetch failed, serving cached bundle"
                    );
                    return Ok(bundle);
                }
                Err(err.into())
            }
        }
    }

    /// Fetches and caches a fresh bundle if the cached one is stale,
    /// expired, or absent. Returns whether a fetch was performed.
    pub fn refresh_if_stale(&self, latitude: f64, longitude: f64) -> Result<bool, ServiceError> {
        let cell = GeoCell::from_degrees(latitude, longitude)?;

        if !self.cache.should_refresh(cell) {
            return Ok(false);
        }

        let bundle = self.provider.fetch(cell)?;
        self.cache.put(cell, bundle)?;
        Ok(true)
    }

    /// Removes expired entries from both cache tiers.
    ///
    /// Intended to be called opportunistically, for example when the
    /// application returns to the foreground.
    pub fn clear_expired(&self) -> Result<u64, ServiceError> {
        Ok(self.cache.clear_expired()?)
    }

    /// Snapshot of cache statistics for diagnostics.
    pub fn statistics(&self) -> CacheStatistics {
        self.cache.statistics()
    }
}
