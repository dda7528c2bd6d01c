//! Weather payload types.
//!
//! `WeatherBundle` is the unit the cache stores and the provider produces.
//! Conditions are mapped from WMO weather codes as reported by Open-Meteo.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Weather condition categories mapped from WMO codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Sleet,
    Snow,
    Thunderstorm,
    Unknown,
}

impl WeatherCondition {
    /// Convert a WMO weather code to a condition category.
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: u8) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            // Freezing drizzle and freezing rain
            56 | 57 | 66 | 67 => Self::Sleet,
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }

    /// Human-readable label for logs and diagnostics.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Sleet => "Sleet",
            Self::Snow => "Snow",
            Self::Thunderstorm => "Thunderstorm",
            Self::Unknown => "Unknown",
        }
    }
}

/// Current conditions at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_kmh: f64,
    pub condition: WeatherCondition,
}

/// One hour of forecast data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntry {
    pub time: DateTime<Utc>,
    pub temperature_c: f64,
    pub condition: WeatherCondition,
    pub precipitation_chance_pct: u8,
}

/// One day of forecast data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub high_c: f64,
    pub low_c: f64,
    pub condition: WeatherCondition,
    pub precipitation_chance_pct: u8,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

/// Complete weather data for one location fetch.
///
/// This is the payload the cache serializes to disk, one file per
/// geographic cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherBundle {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyEntry>,
    pub daily: Vec<DailyEntry>,
    pub latitude: f64,
    pub longitude: f64,
    pub fetched_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wmo_code_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
    }

    #[test]
    fn test_wmo_code_partly_cloudy() {
        assert_eq!(
            WeatherCondition::from_wmo_code(1),
            WeatherCondition::PartlyCloudy
        );
        assert_eq!(
            WeatherCondition::from_wmo_code(2),
            WeatherCondition::PartlyCloudy
        );
    }

    #[test]
    fn test_wmo_code_cloudy() {
        assert_eq!(WeatherCondition::from_wmo_code(3), WeatherCondition::Cloudy);
    }

    #[test]
    fn test_wmo_code_fog() {
        assert_eq!(WeatherCondition::from_wmo_code(45), WeatherCondition::Fog);
        assert_eq!(WeatherCondition::from_wmo_code(48), WeatherCondition::Fog);
    }

    #[test]
    fn test_wmo_code_drizzle() {
        for code in [51, 53, 55] {
            assert_eq!(
                WeatherCondition::from_wmo_code(code),
                WeatherCondition::Drizzle
            );
        }
    }

    #[test]
    fn test_wmo_code_sleet() {
        for code in [56, 57, 66, 67] {
            assert_eq!(
                WeatherCondition::from_wmo_code(code),
                WeatherCondition::Sleet
            );
        }
    }

    #[test]
    fn test_wmo_code_rain() {
        for code in [61, 63, 80] {
            assert_eq!(WeatherCondition::from_wmo_code(code), WeatherCondition::Rain);
        }
    }

    #[test]
    fn test_wmo_code_heavy_rain() {
        for code in [65, 81, 82] {
            assert_eq!(
                WeatherCondition::from_wmo_code(code),
                WeatherCondition::HeavyRain
            );
        }
    }

    #[test]
    fn test_wmo_code_snow() {
        for code in [71, 73, 75, 77, 85, 86] {
            assert_eq!(WeatherCondition::from_wmo_code(code), WeatherCondition::Snow);
        }
    }

    #[test]
    fn test_wmo_code_thunderstorm() {
        for code in [95, 96, 99] {
            assert_eq!(
                WeatherCondition::from_wmo_code(code),
                WeatherCondition::Thunderstorm
            );
        }
    }

    #[test]
    fn test_wmo_code_unrecognized() {
        assert_eq!(
            WeatherCondition::from_wmo_code(42),
            WeatherCondition::Unknown
        );
        assert_eq!(
            WeatherCondition::from_wmo_code(255),
            WeatherCondition::Unknown
        );
    }

    #[test]
    fn test_condition_description() {
        assert_eq!(WeatherCondition::Clear.description(), "Clear");
        assert_eq!(
            WeatherCondition::Thunderstorm.description(),
            "Thunderstorm"
        );
    }

    #[test]
    fn test_bundle_serialization_round_trip() {
        let bundle = WeatherBundle {
            current: CurrentConditions {
                temperature_c: 18.5,
                feels_like_c: 17.2,
                humidity_pct: 64,
                wind_speed_kmh: 12.3,
                condition: WeatherCondition::PartlyCloudy,
            },
            hourly: vec![HourlyEntry {
                time: Utc::now(),
                temperature_c: 19.0,
                condition: WeatherCondition::Clear,
                precipitation_chance_pct: 5,
            }],
            daily: vec![],
            latitude: 37.7749,
            longitude: -122.4194,
            fetched_at: Utc::now(),
        };

        let json = serde_json::to_vec(&bundle).unwrap();
        let parsed: WeatherBundle = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed, bundle);
    }
}
