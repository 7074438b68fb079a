use crate::error::ConfigError;
use core_types::Town;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty `config.toml` (or none at all)
/// yields a runnable local setup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub weather: WeatherConfig,
    pub prediction: PredictionParams,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Rejects values that would deserialize fine but make no sense at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.prediction.validate()?;

        if self.weather.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "weather.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if !(1..=16).contains(&self.weather.forecast_days) {
            return Err(ConfigError::ValidationError(
                "weather.forecast_days must be between 1 and 16".to_string(),
            ));
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(ConfigError::ValidationError(
                "auth.bcrypt_cost must be between 4 and 31".to_string(),
            ));
        }
        if self.auth.session_ttl_hours == 0 {
            return Err(ConfigError::ValidationError(
                "auth.session_ttl_hours must be greater than 0".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }
        self.server.socket_addr()?;
        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on request bodies, in bytes.
    pub body_limit_bytes: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::ValidationError(format!("invalid server address: {e}")))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

/// Record store connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// A `sqlite:` URL. Overridden by the `DATABASE_URL` environment variable.
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://harvest.db".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 5,
        }
    }
}

/// Settings for the Open-Meteo gateway.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// IANA timezone passed through to the API so daily buckets line up locally.
    pub timezone: String,
    pub forecast_days: u8,
    pub default_town: Town,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com".to_string(),
            timeout_secs: 10,
            timezone: "Asia/Colombo".to_string(),
            forecast_days: 7,
            default_town: Town::Anuradhapura,
        }
    }
}

/// How the held-out partition is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Seeded shuffle, then the first rows of the shuffled order are held out.
    Shuffled,
    /// The most recent rows are held out; no randomness involved.
    Tail,
}

/// Parameters for the price/profit prediction engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PredictionParams {
    /// Number of future points the analytics page asks for.
    pub horizon: usize,
    /// Below this many records the engine reports a mean baseline instead of a regression.
    pub min_fit_records: usize,
    /// Only the most recent `max_records` rows are fitted when set.
    pub max_records: Option<usize>,
    /// Fraction of rows held out for evaluation.
    pub test_fraction: f64,
    pub split: SplitStrategy,
    /// Seed for `SplitStrategy::Shuffled`.
    pub seed: u64,
    /// How many trailing rows drive the per-feature trend used for projection.
    pub trend_window: usize,
    /// When every feature of a model is constant, fall back to an intercept-only
    /// model instead of failing.
    pub degenerate_fallback: bool,
}

impl PredictionParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon == 0 {
            return Err(ConfigError::ValidationError(
                "prediction.horizon must be at least 1".to_string(),
            ));
        }
        if self.min_fit_records < 2 {
            return Err(ConfigError::ValidationError(
                "prediction.min_fit_records must be at least 2".to_string(),
            ));
        }
        if let Some(cap) = self.max_records
            && cap < self.min_fit_records
        {
            return Err(ConfigError::ValidationError(
                "prediction.max_records must not be below prediction.min_fit_records".to_string(),
            ));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction <= 0.5) {
            return Err(ConfigError::ValidationError(
                "prediction.test_fraction must be in (0, 0.5]".to_string(),
            ));
        }
        if self.trend_window < 2 {
            return Err(ConfigError::ValidationError(
                "prediction.trend_window must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PredictionParams {
    fn default() -> Self {
        Self {
            horizon: 3,
            min_fit_records: 5,
            max_records: None,
            test_fraction: 0.2,
            split: SplitStrategy::Shuffled,
            seed: 42,
            trend_window: 5,
            degenerate_fallback: true,
        }
    }
}

/// Account and session settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub session_ttl_hours: u64,
    pub bcrypt_cost: u32,
    /// Sets the `Secure` attribute on the session cookie.
    pub cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24 * 7,
            bcrypt_cost: 12,
            cookie_secure: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level; `RUST_LOG` wins when set.
    pub level: LogLevel,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            directory: None,
            file_prefix: "harvest.log".to_string(),
        }
    }
}
