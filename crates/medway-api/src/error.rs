//! HTTP error response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use medway_core::AppError;
use medway_store::StoreError;
use serde::Serialize;
use utoipa::ToSchema;

/// Structured failure body: numeric status, human-readable message, and an
/// internal diagnostic for unexpected faults.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse. Necessary because
/// of orphan rules: AppError lives in medway-core.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let err = &self.0;
        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %err, code = err.error_code(), "Request failed");
        } else {
            tracing::debug!(error = %err, code = err.error_code(), "Request rejected");
        }

        let details = err.is_internal().then(|| err.to_string());
        let body = ErrorResponse {
            status: status.as_u16(),
            error: err.client_message(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

// Store errors cross into HTTP land only on the fetch/stream endpoints;
// batch ingestion contains them per item before they get here.
impl From<StoreError> for HttpAppError {
    fn from(err: StoreError) -> Self {
        let app = match &err {
            StoreError::NotFound(_) => AppError::NotFound("File not found".to_string()),
            StoreError::InvalidRange { .. } => AppError::UnsatisfiableRange(err.to_string()),
            _ => AppError::Store(err.to_string()),
        };
        HttpAppError(app)
    }
}
