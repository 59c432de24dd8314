use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors visible to HTTP callers.
///
/// Only failures before the store commit end up here. Publish-phase
/// failures stay inside the publish task and surface through logs and
/// metrics only.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid transaction data: {0}")]
    Validation(String),

    #[error("Transaction not found: {0}")]
    NotFound(String),

    #[error("Duplicate transaction: {0}")]
    Duplicate(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ledger_core::Error> for ServiceError {
    fn from(err: ledger_core::Error) -> Self {
        match err {
            ledger_core::Error::Validation(msg) => ServiceError::Validation(msg),
            ledger_core::Error::TransactionNotFound(id) => ServiceError::NotFound(id),
            ledger_core::Error::DuplicateTransaction(id) => ServiceError::Duplicate(id),
            ledger_core::Error::Concurrency(msg) => ServiceError::Unavailable(msg),
            ledger_core::Error::Config(msg) => ServiceError::Internal(msg),
        }
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Duplicate(_) => StatusCode::CONFLICT,
            ServiceError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ServiceError::Validation(details) => json!({
                "error": "Invalid transaction data",
                "details": details,
            }),
            ServiceError::NotFound(_) => json!({ "message": "Transaction not found." }),
            ServiceError::Duplicate(id) => json!({
                "error": "Transaction already exists",
                "transaction_id": id,
            }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
