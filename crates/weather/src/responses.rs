use crate::conditions;
use crate::error::WeatherError;
use chrono::{NaiveDate, NaiveDateTime};
use core_types::Town;
use serde::{Deserialize, Serialize};

// --- Raw Open-Meteo payload ---

/// The subset of `GET /v1/forecast` this crate asks for.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ForecastResponse {
    pub current: Option<RawCurrent>,
    pub daily: Option<RawDaily>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCurrent {
    pub time: String,
    pub temperature_2m: f64,
    pub relative_humidity_2m: f64,
    pub wind_speed_10m: f64,
    pub precipitation: f64,
    pub weather_code: u8,
}

/// Column-oriented daily block: index `i` of every vector is day `i`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawDaily {
    pub time: Vec<String>,
    pub weather_code: Vec<u8>,
    pub temperature_2m_max: Vec<f64>,
    pub temperature_2m_min: Vec<f64>,
    pub precipitation_sum: Vec<f64>,
}

// --- Normalized structures ---

/// Conditions at observation time, in the town's local time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub town: Town,
    pub observed_at: NaiveDateTime,
    pub temperature_c: f64,
    pub relative_humidity_pct: f64,
    pub wind_speed_kmh: f64,
    pub precipitation_mm: f64,
    pub weather_code: u8,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub weather_code: u8,
    pub description: String,
    pub icon: String,
    pub temperature_max_c: f64,
    pub temperature_min_c: f64,
    pub precipitation_mm: f64,
}

impl RawCurrent {
    pub(crate) fn normalize(self, town: Town) -> Result<CurrentConditions, WeatherError> {
        let observed_at = NaiveDateTime::parse_from_str(&self.time, "%Y-%m-%dT%H:%M")
            .map_err(|e| WeatherError::Malformed(format!("current.time '{}': {e}", self.time)))?;

        Ok(CurrentConditions {
            town,
            observed_at,
            temperature_c: self.temperature_2m,
            relative_humidity_pct: self.relative_humidity_2m,
            wind_speed_kmh: self.wind_speed_10m,
            precipitation_mm: self.precipitation,
            weather_code: self.weather_code,
            description: conditions::describe(self.weather_code).to_string(),
            icon: conditions::icon(self.weather_code).to_string(),
        })
    }
}

impl RawDaily {
    pub(crate) fn normalize(self) -> Result<Vec<DailyForecast>, WeatherError> {
        let days = self.time.len();
        let lengths = [
            self.weather_code.len(),
            self.temperature_2m_max.len(),
            self.temperature_2m_min.len(),
            self.precipitation_sum.len(),
        ];
        if lengths.iter().any(|len| *len != days) {
            return Err(WeatherError::Malformed(format!(
                "daily arrays disagree in length: time has {days}, others have {lengths:?}"
            )));
        }

        self.time
            .iter()
            .enumerate()
            .map(|(i, day)| {
                let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
                    .map_err(|e| WeatherError::Malformed(format!("daily.time '{day}': {e}")))?;
                let code = self.weather_code[i];
                Ok(DailyForecast {
                    date,
                    weather_code: code,
                    description: conditions::describe(code).to_string(),
                    icon: conditions::icon(code).to_string(),
                    temperature_max_c: self.temperature_2m_max[i],
                    temperature_min_c: self.temperature_2m_min[i],
                    precipitation_mm: self.precipitation_sum[i],
                })
            })
            .collect()
    }
}
