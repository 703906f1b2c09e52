use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub mod open_meteo;

pub use open_meteo::OpenMeteoProvider;

/// Why a single city's weather could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider answered with status {0}")]
    Status(u16),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Source of current temperatures for a coordinate.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current temperature in degrees Celsius at (`latitude`, `longitude`).
    async fn current_temperature(&self, latitude: f64, longitude: f64) -> Result<f64, FetchError>;
}
