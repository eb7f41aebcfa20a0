//! Error types for the synthetic publisher.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PopulateError {
    #[error("Pulsar client error: {0}")]
    Client(#[from] pulsar_client::ClientError),

    #[error("Generator error: {0}")]
    Generator(#[from] loadtest_generator::GeneratorError),

    #[error("Event encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Publish rate must be at least 1 message per second, got {0}")]
    InvalidRate(u32),
}

pub type Result<T> = std::result::Result<T, PopulateError>;
