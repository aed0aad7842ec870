use anyhow::Context;
use medway_api::{build_router, AppState};
use medway_core::Config;
use medway_processing::{FfmpegTranscoder, IngestionPipeline, ToolPaths};
use medway_store::{BlobStore, FsChunkStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store: Arc<dyn BlobStore> = Arc::new(
        FsChunkStore::new(&config.store_root)
            .await
            .context("failed to open blob store")?,
    );

    let tools = ToolPaths {
        ffmpeg: config.ffmpeg_path.clone(),
        ffprobe: config.ffprobe_path.clone(),
    };
    let transcoder = Arc::new(
        FfmpegTranscoder::new(tools, store.clone()).context("failed to set up transcoder")?,
    );
    let pipeline = IngestionPipeline::new(store.clone(), transcoder);

    tokio::fs::create_dir_all(&config.staging_dir)
        .await
        .context("failed to create staging directory")?;

    let state = Arc::new(AppState {
        store,
        pipeline,
        config: config.clone(),
    });
    let router = build_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, router).await?;

    Ok(())
}
