//! Error types for the admin client.

use thiserror::Error;

/// Errors returned by admin API calls.
#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned status {status}: {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("Invalid name: {0}")]
    InvalidName(#[from] pulsar_types::TypesError),

    #[error("OAuth token request failed: {0}")]
    OAuth(String),

    #[error("Admin client configuration error: {0}")]
    Config(String),
}

impl AdminError {
    /// HTTP status code of the failed call, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            AdminError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

/// Result type alias for admin operations.
pub type Result<T> = std::result::Result<T, AdminError>;
