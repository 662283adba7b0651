//! SDK Error Types

use thiserror::Error;

/// SDK Result type
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK Error
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response body (HTTP {status}): {message}")]
    Decode { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Envelope error: {0}")]
    Envelope(#[from] bytegenie_core::EnvelopeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
