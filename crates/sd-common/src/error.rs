//! Error types for the status dashboard.

use thiserror::Error;

/// Result type alias for dashboard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the status dashboard.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // Data-access errors (20-29)
    #[error("failed to fetch {family} data: {message}")]
    DataFetch { family: String, message: String },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    // Serving errors (30-39)
    #[error("failed to bind {addr}: {message}")]
    Bind { addr: String, message: String },

    #[error("server error: {0}")]
    Serve(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidConfig(_) => 11,
            Error::DataFetch { .. } => 20,
            Error::StoreUnavailable(_) => 21,
            Error::Bind { .. } => 30,
            Error::Serve(_) => 31,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Whether this error originated in the data-access layer.
    pub fn is_data_access(&self) -> bool {
        matches!(self, Error::DataFetch { .. } | Error::StoreUnavailable(_))
    }
}
