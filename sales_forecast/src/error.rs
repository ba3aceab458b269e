//! Error types for the sales_forecast crate

use sales_math::MathError;
use thiserror::Error;

/// How a failure should be surfaced to the caller of a serving operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is at fault; no model was invoked
    Validation,
    /// The request is well formed but refers to something that does not exist
    NotFound,
    /// The service failed while handling a valid request
    Internal,
}

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum SalesError {
    /// A request field is missing, malformed or out of range
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A date string is not in DD-MM-YYYY form
    #[error("Parse error: {0}")]
    ParseError(String),

    /// No forecaster artifact exists for the store
    #[error("No forecasting model found for store {0}")]
    ForecasterNotFound(u32),

    /// A model rejected its input or produced an unusable output
    #[error("Model error: {0}")]
    ModelError(String),

    /// A model artifact could not be decoded or failed its load-time checks
    #[error("Artifact error: {0}")]
    ArtifactError(String),

    /// Error from the observation store
    #[error("Store error: {0}")]
    StoreError(String),

    /// The run tracker could not answer a monitor query
    #[error("Run tracker error: {0}")]
    TrackerError(String),

    /// Error from the configuration layer
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error from forecasting math
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SalesError {
    /// Classify the error for the transport layer
    pub fn kind(&self) -> ErrorKind {
        match self {
            SalesError::ValidationError(_) | SalesError::ParseError(_) => ErrorKind::Validation,
            SalesError::ForecasterNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Internal,
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, SalesError>;

impl From<rusqlite::Error> for SalesError {
    fn from(err: rusqlite::Error) -> Self {
        SalesError::StoreError(err.to_string())
    }
}

impl From<csv::Error> for SalesError {
    fn from(err: csv::Error) -> Self {
        SalesError::StoreError(format!("CSV: {}", err))
    }
}

impl From<chrono::ParseError> for SalesError {
    fn from(err: chrono::ParseError) -> Self {
        SalesError::ParseError(err.to_string())
    }
}

impl From<toml::de::Error> for SalesError {
    fn from(err: toml::de::Error) -> Self {
        SalesError::ConfigError(err.to_string())
    }
}

/// Errors raised by run tracker backends
///
/// On the predict and forecast paths the service logs and drops them; only
/// the monitor query surfaces them, as [`SalesError::TrackerError`].
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("Tracking backend unavailable: {0}")]
    Unavailable(String),

    #[error("Tracking IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tracking encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl From<TrackingError> for SalesError {
    fn from(err: TrackingError) -> Self {
        SalesError::TrackerError(err.to_string())
    }
}
