use medway_core::Config;
use medway_processing::IngestionPipeline;
use medway_store::BlobStore;
use std::sync::Arc;

/// Shared application state: the blob store, the ingestion pipeline wired
/// to it, and the startup configuration.
pub struct AppState {
    pub store: Arc<dyn BlobStore>,
    pub pipeline: IngestionPipeline,
    pub config: Config,
}

#[allow(dead_code)]
fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    assert_send::<AppState>();
    assert_sync::<AppState>();
}
