use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use core_types::CoreError;
use database::DbError;
use serde_json::json;
use thiserror::Error;

/// Shown to the user whenever the weather service cannot be used.
pub const WEATHER_FALLBACK: &str = "Unable to fetch weather data. Please try again.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("Prediction error: {0}")]
    Prediction(#[from] analytics::PredictionError),
    #[error("Weather error: {0}")]
    Weather(#[from] weather::WeatherError),
    #[error("Configuration error: {0}")]
    Config(#[from] configuration::error::ConfigError),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownTown(_) => AppError::BadRequest(err.to_string()),
            CoreError::InvalidInput(..) => AppError::Validation(err.to_string()),
        }
    }
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(DbError::Conflict(field)) => {
                let message = match field.as_str() {
                    "username" => "Username already exists.".to_string(),
                    "email" => "Email already registered.".to_string(),
                    other => format!("{other} is already taken."),
                };
                (StatusCode::CONFLICT, message)
            }
            AppError::Database(DbError::NotFound) => {
                (StatusCode::NOT_FOUND, "The requested data was not found".to_string())
            }
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Prediction(prediction_err) => {
                tracing::error!(error = ?prediction_err, "Prediction error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred during analysis".to_string(),
                )
            }
            AppError::Weather(weather_err) => {
                tracing::error!(error = ?weather_err, "Weather gateway error.");
                (StatusCode::BAD_GATEWAY, WEATHER_FALLBACK.to_string())
            }
            AppError::Config(config_err) => {
                tracing::error!(error = ?config_err, "Configuration error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A server configuration error occurred".to_string(),
                )
            }
            AppError::Internal(message) => {
                tracing::error!(%message, "Internal error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Validation(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
