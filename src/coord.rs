//! Geographic cell derivation for cache keys.
//!
//! Coordinates are rounded to 4 decimal digits (~11m resolution) so that
//! nearby requests collapse onto one cache entry. This is a deliberate
//! precision/hit-rate tradeoff.

use std::fmt;
use thiserror::Error;

/// Errors from coordinate validation.
#[derive(Debug, Error, PartialEq)]
pub enum CoordError {
    /// Latitude out of valid range
    #[error("Invalid latitude {0}: must be between -90.0 and 90.0")]
    InvalidLatitude(f64),

    /// Longitude out of valid range
    #[error("Invalid longitude {0}: must be between -180.0 and 180.0")]
    InvalidLongitude(f64),
}

/// A geographic cell at 4-decimal-digit resolution.
///
/// Stores coordinates as degrees scaled by 10^4 and rounded to the nearest
/// integer. The integer representation gives stable equality and hashing,
/// and normalizes negative zero (so -0.00001 and 0.0 land in the same cell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeoCell {
    lat_e4: i32,
    lon_e4: i32,
}

impl GeoCell {
    /// Derive the cell containing the given coordinates.
    ///
    /// Returns an error if either coordinate is outside its valid range
    /// (latitude -90..=90, longitude -180..=180). NaN is rejected.
    pub fn from_degrees(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordError::InvalidLatitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordError::InvalidLongitude(longitude));
        }

        Ok(Self {
            lat_e4: (latitude * 10_000.0).round() as i32,
            lon_e4: (longitude * 10_000.0).round() as i32,
        })
    }

    /// Cell latitude in degrees (rounded to 4 decimals).
    pub fn latitude(&self) -> f64 {
        self.lat_e4 as f64 / 10_000.0
    }

    /// Cell longitude in degrees (rounded to 4 decimals).
    pub fn longitude(&self) -> f64 {
        self.lon_e4 as f64 / 10_000.0
    }

    /// Stable string key for this cell, e.g. `"37.7749_-122.4194"`.
    ///
    /// Always carries exactly four fractional digits, reconstructed from
    /// the scaled integers so repeated derivations are byte-identical.
    pub fn key(&self) -> String {
        format!("{}_{}", format_e4(self.lat_e4), format_e4(self.lon_e4))
    }
}

impl fmt::Display for GeoCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", format_e4(self.lat_e4), format_e4(self.lon_e4))
    }
}

/// Format a degrees-times-10^4 integer as a fixed 4-decimal string.
fn format_e4(value: i32) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = (value as i64).abs();
    format!("{}{}.{:04}", sign, magnitude / 10_000, magnitude % 10_000)
}
