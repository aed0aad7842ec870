mod helpers;

use helpers::{seed_blob, setup_test_app};

#[tokio::test]
async fn test_stream_range_returns_requested_window() {
    let app = setup_test_app().await;
    let data: Vec<u8> = (0..1000).map(|i| (i % 251) as u8).collect();
    let blob = seed_blob(app.store.as_ref(), "clip.mp4", &data, Some("video/mp4")).await;

    let response = app
        .client()
        .get("/api/v0/stream")
        .add_query_param("id", blob.id.to_string())
        .add_header("range", "bytes=0-99")
        .await;

    assert_eq!(response.status_code(), 206);
    assert_eq!(response.header("content-range"), "bytes 0-99/1000");
    assert_eq!(response.header("content-length"), "100");
    assert_eq!(response.header("accept-ranges"), "bytes");
    assert_eq!(response.as_bytes().as_ref(), &data[..100]);
}

#[tokio::test]
async fn test_stream_whole_file_still_answers_partial_content() {
    let app = setup_test_app().await;
    let data = vec![42u8; 1000];
    let blob = seed_blob(app.store.as_ref(), "clip.mp4", &data, Some("video/mp4")).await;

    let response = app
        .client()
        .get("/api/v0/stream")
        .add_query_param("id", blob.id.to_string())
        .await;

    // Full-resource responses use 206 as well; documented contract.
    assert_eq!(response.status_code(), 206);
    assert_eq!(response.header("content-length"), "1000");
    assert_eq!(response.header("content-type"), "video/mp4");
    assert_eq!(response.as_bytes().len(), 1000);
}

#[tokio::test]
async fn test_stream_defaults_content_type_when_metadata_absent() {
    let app = setup_test_app().await;
    let blob = seed_blob(app.store.as_ref(), "mystery.bin", b"some bytes", None).await;

    let response = app
        .client()
        .get("/api/v0/stream")
        .add_query_param("id", blob.id.to_string())
        .await;

    assert_eq!(response.status_code(), 206);
    assert_eq!(response.header("content-type"), "video/mp4");
}

#[tokio::test]
async fn test_stream_suffix_range() {
    let app = setup_test_app().await;
    let data: Vec<u8> = (0..1000).map(|i| (i % 251) as u8).collect();
    let blob = seed_blob(app.store.as_ref(), "clip.mp4", &data, Some("video/mp4")).await;

    let response = app
        .client()
        .get("/api/v0/stream")
        .add_query_param("id", blob.id.to_string())
        .add_header("range", "bytes=-100")
        .await;

    assert_eq!(response.status_code(), 206);
    assert_eq!(response.header("content-range"), "bytes 900-999/1000");
    assert_eq!(response.as_bytes().as_ref(), &data[900..]);
}

#[tokio::test]
async fn test_stream_missing_id_rejected_before_lookup() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/v0/stream").await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], "Missing required id");
}

#[tokio::test]
async fn test_stream_malformed_id_rejected() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/v0/stream")
        .add_query_param("id", "not-a-blob-id")
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_stream_unknown_id_not_found() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/v0/stream")
        .add_query_param("id", uuid::Uuid::new_v4().to_string())
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_stream_multiple_ranges_rejected() {
    let app = setup_test_app().await;
    let blob = seed_blob(app.store.as_ref(), "clip.mp4", &[0u8; 1000], None).await;

    let response = app
        .client()
        .get("/api/v0/stream")
        .add_query_param("id", blob.id.to_string())
        .add_header("range", "bytes=0-99,200-299")
        .await;

    assert_eq!(response.status_code(), 416);
}

#[tokio::test]
async fn test_stream_non_byte_unit_rejected() {
    let app = setup_test_app().await;
    let blob = seed_blob(app.store.as_ref(), "clip.mp4", &[0u8; 1000], None).await;

    let response = app
        .client()
        .get("/api/v0/stream")
        .add_query_param("id", blob.id.to_string())
        .add_header("range", "items=0-99")
        .await;

    assert_eq!(response.status_code(), 416);
}

#[tokio::test]
async fn test_stream_range_past_end_rejected() {
    let app = setup_test_app().await;
    let blob = seed_blob(app.store.as_ref(), "clip.mp4", &[0u8; 1000], None).await;

    let response = app
        .client()
        .get("/api/v0/stream")
        .add_query_param("id", blob.id.to_string())
        .add_header("range", "bytes=1000-1100")
        .await;

    assert_eq!(response.status_code(), 416);
}

#[tokio::test]
async fn test_fetch_image_returns_stored_content_type() {
    let app = setup_test_app().await;
    let blob = seed_blob(app.store.as_ref(), "pic.gif", b"GIF89a", Some("image/gif")).await;

    let response = app
        .client()
        .get("/api/v0/images/file")
        .add_query_param("id", blob.id.to_string())
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "image/gif");
    assert_eq!(response.as_bytes().as_ref(), b"GIF89a");
}

#[tokio::test]
async fn test_fetch_image_defaults_to_png() {
    let app = setup_test_app().await;
    let blob = seed_blob(app.store.as_ref(), "pic", b"bytes", None).await;

    let response = app
        .client()
        .get("/api/v0/images/file")
        .add_query_param("id", blob.id.to_string())
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "image/png");
}

#[tokio::test]
async fn test_fetch_image_missing_id_rejected() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/v0/images/file").await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_fetch_image_unknown_id_not_found() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/v0/images/file")
        .add_query_param("id", uuid::Uuid::new_v4().to_string())
        .await;

    assert_eq!(response.status_code(), 404);
}
