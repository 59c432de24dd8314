//! Error types for message bus

use thiserror::Error;

/// Message bus error
#[derive(Debug, Error)]
pub enum Error {
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Broker rejected or failed to acknowledge a message
    #[error("Transport error: {0}")]
    Transport(String),

    /// Payload could not be encoded (never retried)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Publish did not finish within its deadline
    #[error("Deadline exceeded after {0}ms")]
    DeadlineExceeded(u64),

    /// Header name or value that cannot be framed on the wire
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Stream could not be created or looked up
    #[error("Stream provisioning error: {0}")]
    StreamProvisioning(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure of a single publish call
pub type PublishError = Error;

impl Error {
    /// Whether another attempt inside the same deadline may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Transport(_))
    }

    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Connection(_) => "connection",
            Error::Transport(_) => "transport",
            Error::Serialization(_) => "serialization",
            Error::DeadlineExceeded(_) => "deadline_exceeded",
            Error::InvalidHeader(_) => "invalid_header",
            Error::StreamProvisioning(_) => "stream_provisioning",
            Error::Config(_) => "config",
        }
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
