use std::sync::Arc;
use tubely_db::VideoStore;
use tubely_processing::UploadPipeline;
use tubely_storage::Storage;

/// Size limits applied by the upload handlers
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_video_size_bytes: u64,
    pub max_thumbnail_size_bytes: u64,
}

/// Shared application state
pub struct AppState {
    pub videos: Arc<dyn VideoStore>,
    pub storage: Arc<dyn Storage>,
    pub pipeline: Arc<UploadPipeline>,
    pub limits: UploadLimits,
}
