//! Byte-range streaming endpoint.

use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::fetch::{passthrough_body, require_id, BlobQuery};
use crate::range::{resolve_range, RangeOutcome};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use medway_core::AppError;
use std::sync::Arc;

const DEFAULT_STREAM_TYPE: &str = "video/mp4";

/// Serve a blob, or one byte window of it. Responds 206 on every success
/// path, whole-file responses included.
#[utoipa::path(
    get,
    path = "/api/v0/stream",
    tag = "media",
    params(
        ("id" = String, Query, description = "Blob id")
    ),
    responses(
        (status = 206, description = "Blob bytes, whole or the requested window"),
        (status = 400, description = "Missing or malformed id", body = ErrorResponse),
        (status = 404, description = "Unknown blob", body = ErrorResponse),
        (status = 416, description = "Unsupported unit, multiple ranges, or bounds outside the blob", body = ErrorResponse)
    )
)]
pub async fn stream_media(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BlobQuery>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let id = require_id(&query)?;

    let blob = state
        .store
        .find(id)
        .await?
        .ok_or_else(|| HttpAppError(AppError::NotFound("File not found".to_string())))?;

    let content_type = blob
        .metadata
        .content_type
        .clone()
        .unwrap_or_else(|| DEFAULT_STREAM_TYPE.to_string());

    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());

    let builder = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ACCEPT_RANGES, "bytes");

    match resolve_range(range_header, blob.length) {
        RangeOutcome::Whole => {
            let stream = state.store.open_download(id, None).await?;
            builder
                .header(header::CONTENT_LENGTH, blob.length)
                .body(passthrough_body(stream))
                .map_err(build_error)
        }
        RangeOutcome::Range(range) => {
            let stream = state.store.open_download(id, Some(range)).await?;
            builder
                .header(header::CONTENT_LENGTH, range.len())
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", range.start(), range.end(), range.total()),
                )
                .body(passthrough_body(stream))
                .map_err(build_error)
        }
        RangeOutcome::UnsupportedUnit => Err(HttpAppError(AppError::UnsatisfiableRange(
            "Only byte ranges are supported".to_string(),
        ))),
        RangeOutcome::Unsatisfiable => Err(HttpAppError(AppError::UnsatisfiableRange(
            "Invalid range".to_string(),
        ))),
    }
}

fn build_error(e: axum::http::Error) -> HttpAppError {
    HttpAppError(AppError::Internal(format!(
        "failed to build response: {}",
        e
    )))
}
