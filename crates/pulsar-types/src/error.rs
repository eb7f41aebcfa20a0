//! Error types for pulsar-types crate.

use thiserror::Error;

/// Errors that can occur while parsing or converting shared types.
#[derive(Error, Debug)]
pub enum TypesError {
    #[error("Invalid topic name '{name}': {reason}")]
    InvalidTopic { name: String, reason: String },

    #[error("Invalid base64 content: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for pulsar-types operations.
pub type Result<T> = std::result::Result<T, TypesError>;
