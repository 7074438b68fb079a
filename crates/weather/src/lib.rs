use crate::responses::ForecastResponse;
use async_trait::async_trait;
use configuration::WeatherConfig;
use core_types::Town;
use std::time::Duration;

pub mod conditions;
pub mod error;
pub mod responses;

// --- Public API ---
pub use error::WeatherError;
pub use responses::{CurrentConditions, DailyForecast};

/// Open-Meteo serves at most this many forecast days.
pub const MAX_FORECAST_DAYS: u8 = 16;

const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,wind_speed_10m,precipitation,weather_code";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,precipitation_sum";

/// The abstract interface to a weather provider.
///
/// The web layer only ever sees this trait, so tests can swap the live client
/// for a stub or point it at a mock server.
#[async_trait]
pub trait WeatherGateway: Send + Sync {
    async fn get_current(&self, town: Town) -> Result<CurrentConditions, WeatherError>;

    /// Daily forecast starting today. `days` is clamped to `1..=16`.
    async fn get_forecast(&self, town: Town, days: u8) -> Result<Vec<DailyForecast>, WeatherError>;
}

/// A concrete `WeatherGateway` backed by the Open-Meteo forecast API.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
    timezone: String,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("harvest/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timezone: config.timezone.clone(),
        })
    }

    async fn fetch(&self, town: Town, days: u8) -> Result<ForecastResponse, WeatherError> {
        let (latitude, longitude) = town.coordinates();
        let url = format!("{}/v1/forecast", self.base_url);
        tracing::debug!(%town, days, "Requesting weather from {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("timezone", self.timezone.clone()),
                ("forecast_days", days.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(%town, status = status.as_u16(), "Weather service returned an error.");
            return Err(WeatherError::Api(status.as_u16(), text));
        }

        serde_json::from_str::<ForecastResponse>(&text)
            .map_err(|e| WeatherError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl WeatherGateway for OpenMeteoClient {
    async fn get_current(&self, town: Town) -> Result<CurrentConditions, WeatherError> {
        self.fetch(town, 1)
            .await?
            .current
            .ok_or_else(|| WeatherError::Malformed("missing current block".to_string()))?
            .normalize(town)
    }

    async fn get_forecast(&self, town: Town, days: u8) -> Result<Vec<DailyForecast>, WeatherError> {
        let days = days.clamp(1, MAX_FORECAST_DAYS);
        self.fetch(town, days)
            .await?
            .daily
            .ok_or_else(|| WeatherError::Malformed("missing daily block".to_string()))?
            .normalize()
    }
}
