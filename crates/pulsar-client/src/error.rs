use thiserror::Error;

use crate::FlushOutcome;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Failed to open reader on {topic}: {reason}")]
    OpenReader { topic: String, reason: String },

    #[error("Failed to open publisher on {topic}: {reason}")]
    OpenPublisher { topic: String, reason: String },

    #[error("Read from {topic} failed: {reason}")]
    Read { topic: String, reason: String },

    #[error("Send to {topic} failed: {reason}")]
    Send { topic: String, reason: String },

    /// The batch could not be pushed out. `settled` holds the sends settled
    /// before the failure, `unsettled` the receipts abandoned with it.
    #[error("Flush of {topic} failed: {reason}")]
    Flush {
        topic: String,
        reason: String,
        settled: FlushOutcome,
        unsettled: u64,
    },

    #[error("Handle on {0} is closed")]
    Closed(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
