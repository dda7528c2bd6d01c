//! Open-Meteo forecast API provider.
//!
//! Fetches current conditions plus hourly and daily forecasts in a
//! single request. Requests use `timeformat=unixtime` so every time
//! field arrives as an epoch second.
//!
//! API reference: https://open-meteo.com/en/docs

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::coord::GeoCell;
use crate::provider::{HttpClient, ProviderError, WeatherProvider};
use crate::weather::{
    CurrentConditions, DailyEntry, HourlyEntry, WeatherBundle, WeatherCondition,
};

/// Public, key-less forecast endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";

/// Weather provider backed by the Open-Meteo forecast API.
pub struct OpenMeteoProvider<C: HttpClient> {
    http_client: C,
    endpoint: String,
}

impl<C: HttpClient> OpenMeteoProvider<C> {
    /// Creates a provider against the public Open-Meteo endpoint.
    pub fn new(http_client: C) -> Self {
        Self::with_endpoint(http_client, DEFAULT_ENDPOINT.to_string())
    }

    /// Creates a provider against a custom endpoint, for self-hosted
    /// instances and tests.
    pub fn with_endpoint(http_client: C, endpoint: String) -> Self {
        Self {
            http_client,
            endpoint,
        }
    }

    /// Builds the forecast URL for a cell.
    fn build_url(&self, cell: GeoCell) -> String {
        format!(
            "{}?latitude={:.4}&longitude={:.4}\
             &current=temperature_2m,apparent_temperature,relative_humidity_2m,wind_speed_10m,weather_code\
             &hourly=temperature_2m,weather_code,precipitation_probability\
             &daily=temperature_2m_max,temperature_2m_min,weather_code,precipitation_probability_max,sunrise,sunset\
             &timezone=UTC&timeformat=unixtime",
            self.endpoint,
            cell.latitude(),
            cell.longitude(),
        )
    }

    fn assemble(&self, cell: GeoCell, response: ForecastResponse) -> Result<WeatherBundle, ProviderError> {
        let current = CurrentConditions {
            temperature_c: response.current.temperature_2m,
            feels_like_c: response.current.apparent_temperature,
            humidity_pct: pct(Some(response.current.relative_humidity_2m)),
            wind_speed_kmh: response.current.wind_speed_10m,
            condition: WeatherCondition::from_wmo_code(response.current.weather_code),
        };

        let mut hourly = Vec::with_capacity(response.hourly.time.len());
        for (i, &ts) in response.hourly.time.iter().enumerate() {
            hourly.push(HourlyEntry {
                time: timestamp(ts)?,
                temperature_c: series_value(&response.hourly.temperature_2m, i, "hourly.temperature_2m")?,
                condition: WeatherCondition::from_wmo_code(series_value(
                    &response.hourly.weather_code,
                    i,
                    "hourly.weather_code",
                )?),
                precipitation_chance_pct: pct(response
                    .hourly
                    .precipitation_probability
                    .get(i)
                    .copied()
                    .flatten()),
            });
        }

        let mut daily = Vec::with_capacity(response.daily.time.len());
        for (i, &ts) in response.daily.time.iter().enumerate() {
            daily.push(DailyEntry {
                date: timestamp(ts)?.date_naive(),
                high_c: series_value(&response.daily.temperature_2m_max, i, "daily.temperature_2m_max")?,
                low_c: series_value(&response.daily.temperature_2m_min, i, "daily.temperature_2m_min")?,
                condition: WeatherCondition::from_wmo_code(series_value(
                    &response.daily.weather_code,
                    i,
                    "daily.weather_code",
                )?),
                precipitation_chance_pct: pct(response
                    .daily
                    .precipitation_probability_max
                    .get(i)
                    .copied()
                    .flatten()),
                sunrise: timestamp(series_value(&response.daily.sunrise, i, "daily.sunrise")?)?,
                sunset: timestamp(series_value(&response.daily.sunset, i, "daily.sunset")?)?,
            });
        }

        Ok(WeatherBundle {
            current,
            hourly,
            daily,
            latitude: cell.latitude(),
            longitude: cell.longitude(),
            fetched_at: Utc::now(),
        })
    }
}

impl<C: HttpClient> WeatherProvider for OpenMeteoProvider<C> {
    fn fetch(&self, cell: GeoCell) -> Result<WeatherBundle, ProviderError> {
        let url = self.build_url(cell);
        tracing::debug!(lat = cell.latitude(), lon = cell.longitude(), "fetching forecast");

        let bytes = self.http_client.get(&url)?;
        let response: ForecastResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        self.assemble(cell, response)
    }

    fn name(&self) -> &str {
        "Open-Meteo"
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    hourly: HourlyBlock,
    daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    apparent_temperature: f64,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
    weather_code: u8,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<i64>,
    temperature_2m: Vec<f64>,
    weather_code: Vec<u8>,
    #[serde(default)]
    precipitation_probability: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<i64>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    weather_code: Vec<u8>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
    sunrise: Vec<i64>,
    sunset: Vec<i64>,
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, ProviderError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| ProviderError::MalformedResponse(format!("timestamp {} out of range", secs)))
}

fn series_value<T: Copy>(series: &[T], index: usize, field: &str) -> Result<T, ProviderError> {
    series.get(index).copied().ok_or_else(|| {
        ProviderError::MalformedResponse(format!("{} shorter than its time axis", field))
    })
}

/// Convert an optional percentage to a clamped integer, treating a
/// missing value as zero.
fn pct(value: Option<f64>) -> u8 {
    value.unwrap_or(0.0).round().clamp(0.0, 100.0) as u8
}
