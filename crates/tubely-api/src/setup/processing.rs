//! Upload pipeline setup

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tubely_core::constants::SUPPORTED_VIDEO_CONTENT_TYPE;
use tubely_core::Config;
use tubely_db::VideoStore;
use tubely_processing::{
    FfmpegOptimizer, FfprobeInspector, StagingManager, UploadPipeline, UploadPipelineConfig,
};
use tubely_storage::Storage;

/// Pipeline limits taken from the loaded configuration.
pub fn pipeline_config(config: &Config) -> UploadPipelineConfig {
    UploadPipelineConfig {
        max_upload_size: config.max_video_size_bytes(),
        upload_timeout: Duration::from_secs(config.upload_timeout_secs()),
        supported_content_type: SUPPORTED_VIDEO_CONTENT_TYPE.to_string(),
    }
}

/// Wire ffprobe, ffmpeg and the staging directory into an upload pipeline
pub async fn setup_pipeline(
    config: &Config,
    storage: Arc<dyn Storage>,
    videos: Arc<dyn VideoStore>,
) -> Result<Arc<UploadPipeline>> {
    let staging_dir = config.upload_temp_dir();
    tokio::fs::create_dir_all(&staging_dir)
        .await
        .with_context(|| format!("Failed to create upload temp dir {}", staging_dir.display()))?;

    let pipeline_config = pipeline_config(config);

    tracing::info!(
        staging_dir = %staging_dir.display(),
        ffprobe_path = %config.ffprobe_path(),
        ffmpeg_path = %config.ffmpeg_path(),
        max_upload_mb = pipeline_config.max_upload_size / 1024 / 1024,
        upload_timeout_secs = pipeline_config.upload_timeout.as_secs(),
        "Upload pipeline configured"
    );

    Ok(Arc::new(UploadPipeline::new(
        pipeline_config,
        Arc::new(FfprobeInspector::new(config.ffprobe_path())),
        Arc::new(FfmpegOptimizer::new(config.ffmpeg_path())),
        storage,
        videos,
        StagingManager::new(staging_dir),
    )))
}
