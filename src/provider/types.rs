//! Provider trait and error type.

use thiserror::Error;

use crate::coord::GeoCell;
use crate::weather::WeatherBundle;

/// Errors from fetching or decoding provider data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Transport-level failure or non-success HTTP status
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body did not match the expected shape
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

/// A source of weather data for a geographic cell.
pub trait WeatherProvider: Send + Sync {
    /// Fetch a complete weather bundle for the cell.
    fn fetch(&self, cell: GeoCell) -> Result<WeatherBundle, ProviderError>;

    /// Provider name for logs and diagnostics.
    fn name(&self) -> &str;
}
