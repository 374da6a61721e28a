use thiserror::Error;

#[derive(Debug, Error)]
pub enum CarbonError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Price fetch failed: {0}")]
    PriceFetch(String),

    #[error("Malformed price table: {0}")]
    PriceFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CarbonError {
    fn from(e: serde_json::Error) -> Self {
        CarbonError::SerializationError(e.to_string())
    }
}
