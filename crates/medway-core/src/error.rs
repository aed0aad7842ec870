//! HTTP-facing error taxonomy.
//!
//! Per-item ingestion faults never reach this type; they are contained at
//! the pipeline boundary. What remains is what the fetch and stream
//! endpoints can answer with.

use thiserror::Error;

/// Fallback message for faults whose detail should not reach clients.
pub const DEFAULT_ERR_MSG: &str = "Something went wrong on our end";

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed request input; rejected before any store access.
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    /// Range outside the blob, multiple ranges, or a non-byte unit.
    #[error("{0}")]
    UnsatisfiableRange(String),
    /// I/O failure talking to the blob store.
    #[error("{0}")]
    Store(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::BadRequest(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::UnsatisfiableRange(_) => 416,
            AppError::Store(_) | AppError::Internal(_) => 500,
        }
    }

    /// Machine-readable error code for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::UnsatisfiableRange(_) => "RANGE_NOT_SATISFIABLE",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for faults that collapse to [`DEFAULT_ERR_MSG`] client-side,
    /// with the real message carried only as a diagnostic payload.
    pub fn is_internal(&self) -> bool {
        matches!(self, AppError::Store(_) | AppError::Internal(_))
    }

    pub fn client_message(&self) -> String {
        if self.is_internal() {
            DEFAULT_ERR_MSG.to_string()
        } else {
            self.to_string()
        }
    }
}
