//! Single-image retrieval.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use futures::StreamExt;
use medway_core::AppError;
use medway_store::{BlobId, ByteStream};
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_IMAGE_TYPE: &str = "image/png";

#[derive(Debug, Deserialize)]
pub struct BlobQuery {
    pub id: Option<String>,
}

/// Parse the id query parameter. Happens before any store access, so a
/// missing or malformed id never costs a lookup.
pub(crate) fn require_id(query: &BlobQuery) -> Result<BlobId, HttpAppError> {
    let raw = query
        .id
        .as_deref()
        .ok_or_else(|| HttpAppError(AppError::BadRequest("Missing required id".to_string())))?;
    raw.parse()
        .map_err(|_| HttpAppError(AppError::BadRequest(format!("Invalid id: {}", raw))))
}

pub(crate) fn passthrough_body(stream: ByteStream) -> Body {
    // A mid-stream store error aborts the response body instead of
    // delivering a silently truncated payload.
    Body::from_stream(
        stream.map(|item| item.map_err(|e| std::io::Error::other(format!("store stream: {}", e)))),
    )
}

#[utoipa::path(
    get,
    path = "/api/v0/images/file",
    tag = "media",
    params(
        ("id" = String, Query, description = "Blob id")
    ),
    responses(
        (status = 200, description = "Raw image bytes with the stored content type"),
        (status = 400, description = "Missing or malformed id", body = ErrorResponse),
        (status = 404, description = "Unknown blob", body = ErrorResponse)
    )
)]
pub async fn fetch_image(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BlobQuery>,
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
        .unwrap_or_else(|| DEFAULT_IMAGE_TYPE.to_string());

    let stream = state.store.open_download(id, None).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, blob.length)
        .body(passthrough_body(stream))
        .map_err(|e| HttpAppError(AppError::Internal(format!("failed to build response: {}", e))))
}
