use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Failed to reach the weather service: {0}")]
    Request(#[from] reqwest::Error),

    #[error("The weather service returned {0}: {1}")]
    Api(u16, String),

    #[error("Malformed weather response: {0}")]
    Malformed(String),
}
