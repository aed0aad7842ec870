//! OpenAPI document served through RapiDoc.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers::ingest::{MediaResponse, VideoResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::ingest::upload_images,
        crate::handlers::ingest::upload_videos,
        crate::handlers::fetch::fetch_image,
        crate::handlers::stream::stream_media,
    ),
    components(schemas(ErrorResponse, MediaResponse, VideoResponse)),
    tags(
        (name = "media", description = "Media ingestion and streaming")
    )
)]
pub struct ApiDoc;
