//! Error types for the ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input could not be turned into a transaction
    #[error("Invalid transaction: {0}")]
    Validation(String),

    /// No record with the given id
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// A record with the same id is already stored (strict mode only)
    #[error("Duplicate transaction: {0}")]
    DuplicateTransaction(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(err.to_string())
    }
}
