//! Weather domain types shared by the cache and the Open-Meteo provider.

mod types;

pub use types::{
    CurrentConditions, DailyEntry, HourlyEntry, WeatherBundle, WeatherCondition,
};
