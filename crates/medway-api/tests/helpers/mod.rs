use axum_test::TestServer;
use medway_api::{build_router, AppState};
use medway_core::Config;
use medway_processing::{FfmpegTranscoder, IngestionPipeline, ToolPaths};
use medway_store::{BlobMetadata, BlobStore, FsChunkStore, StoredBlob};
use std::sync::Arc;
use tempfile::TempDir;

/// Test application with an isolated store root and staging directory.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<dyn BlobStore>,
    pub staging_dir: std::path::PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Number of files currently sitting in the staging directory.
    pub async fn staged_file_count(&self) -> usize {
        let mut entries = tokio::fs::read_dir(&self.staging_dir).await.unwrap();
        let mut count = 0;
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        count
    }
}

pub async fn setup_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let store_root = temp_dir.path().join("blobs");
    let staging_dir = temp_dir.path().join("staging");

    let store: Arc<dyn BlobStore> = Arc::new(
        FsChunkStore::new(&store_root)
            .await
            .expect("Failed to create blob store"),
    );

    let config = Config {
        server_port: 0,
        store_root,
        staging_dir: staging_dir.clone(),
        ffmpeg_path: "ffmpeg".to_string(),
        ffprobe_path: "ffprobe".to_string(),
        max_video_duration_secs: 20.0,
        max_body_bytes: 10 * 1024 * 1024,
    };

    let tools = ToolPaths {
        ffmpeg: config.ffmpeg_path.clone(),
        ffprobe: config.ffprobe_path.clone(),
    };
    let transcoder = Arc::new(
        FfmpegTranscoder::new(tools, store.clone()).expect("Failed to create transcoder"),
    );
    let pipeline = IngestionPipeline::new(store.clone(), transcoder);

    tokio::fs::create_dir_all(&staging_dir)
        .await
        .expect("Failed to create staging directory");

    let state = Arc::new(AppState {
        store: store.clone(),
        pipeline,
        config,
    });

    let server = TestServer::new(build_router(state)).expect("Failed to create test server");

    TestApp {
        server,
        store,
        staging_dir,
        _temp_dir: temp_dir,
    }
}

/// Seed a committed blob directly through the store.
pub async fn seed_blob(
    store: &dyn BlobStore,
    name: &str,
    data: &[u8],
    content_type: Option<&str>,
) -> StoredBlob {
    let metadata = BlobMetadata {
        content_type: content_type.map(|s| s.to_string()),
        original_filename: Some(name.to_string()),
        poster_id: None,
    };
    let mut sink = store
        .begin_upload(name, metadata)
        .await
        .expect("begin_upload");
    sink.write(data).await.expect("write");
    sink.finish().await.expect("finish")
}
