//! Weather data provider abstraction.
//!
//! The [`WeatherProvider`] trait decouples the fetch service from the
//! concrete forecast API. [`OpenMeteoProvider`] is the production
//! implementation, generic over an [`HttpClient`] so tests can inject
//! canned responses.

mod http;
mod open_meteo;
mod types;

pub use http::{HttpClient, ReqwestClient};
pub use open_meteo::{OpenMeteoProvider, DEFAULT_ENDPOINT};
pub use types::{ProviderError, WeatherProvider};

#[cfg(test)]
pub use http::tests::MockHttpClient;
