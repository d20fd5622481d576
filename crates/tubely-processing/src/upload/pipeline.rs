//! The video upload pipeline.
//!
//! A run walks a fixed sequence of stages and stops at the first failure:
//!
//! 1. validate the declared content type
//! 2. stage the request body to a temp file, bounded by `max_upload_size`
//! 3. classify the aspect ratio (ffprobe)
//! 4. remux for faststart (ffmpeg)
//! 5. derive the object key from the classification
//! 6. stream the remuxed file to the object store, bounded by `upload_timeout`
//! 7. write the public URL onto the video record
//!
//! Every staged file is released before `run` returns, whichever stage failed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::AsyncRead;
use tubely_core::constants::{MAX_VIDEO_UPLOAD_BYTES, SUPPORTED_VIDEO_CONTENT_TYPE, UPLOAD_TIMEOUT_SECS};
use tubely_core::{AspectClassification, Video};
use tubely_db::VideoStore;
use tubely_storage::{derive_video_key, Storage};
use uuid::Uuid;

use super::staging::{StagedFile, StagingManager};
use super::types::{UploadError, UploadOutcome, UploadRequest};
use crate::video::{optimized_path_for, MediaInspector, StreamOptimizer};

/// Immutable limits for one pipeline instance.
#[derive(Debug, Clone)]
pub struct UploadPipelineConfig {
    pub max_upload_size: u64,
    pub upload_timeout: Duration,
    pub supported_content_type: String,
}

impl Default for UploadPipelineConfig {
    fn default() -> Self {
        Self {
            max_upload_size: MAX_VIDEO_UPLOAD_BYTES,
            upload_timeout: Duration::from_secs(UPLOAD_TIMEOUT_SECS),
            supported_content_type: SUPPORTED_VIDEO_CONTENT_TYPE.to_string(),
        }
    }
}

/// Media type of a `Content-Type` value: parameters dropped, lowercased.
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

pub struct UploadPipeline {
    config: UploadPipelineConfig,
    inspector: Arc<dyn MediaInspector>,
    optimizer: Arc<dyn StreamOptimizer>,
    storage: Arc<dyn Storage>,
    videos: Arc<dyn VideoStore>,
    staging: StagingManager,
}

impl UploadPipeline {
    pub fn new(
        config: UploadPipelineConfig,
        inspector: Arc<dyn MediaInspector>,
        optimizer: Arc<dyn StreamOptimizer>,
        storage: Arc<dyn Storage>,
        videos: Arc<dyn VideoStore>,
        staging: StagingManager,
    ) -> Self {
        Self {
            config,
            inspector,
            optimizer,
            storage,
            videos,
            staging,
        }
    }

    pub fn config(&self) -> &UploadPipelineConfig {
        &self.config
    }

    pub fn staging(&self) -> &StagingManager {
        &self.staging
    }

    /// Fetch `video_id` and check that `owner_id` owns it.
    pub async fn load_owned_record(
        &self,
        owner_id: Uuid,
        video_id: Uuid,
    ) -> Result<Video, UploadError> {
        let video = self
            .videos
            .get_video(video_id)
            .await
            .map_err(UploadError::Lookup)?
            .ok_or(UploadError::NotFound(video_id))?;

        if !video.is_owned_by(owner_id) {
            return Err(UploadError::Forbidden {
                user_id: owner_id,
                video_id,
            });
        }

        Ok(video)
    }

    /// Run the whole pipeline for one upload.
    ///
    /// The ownership check happens before anything is read from `request.body`.
    #[tracing::instrument(skip(self, request), fields(video_id = %request.video_id, user_id = %request.owner_id))]
    pub async fn run<R>(&self, request: UploadRequest<R>) -> Result<UploadOutcome, UploadError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let start = Instant::now();
        let record = self
            .load_owned_record(request.owner_id, request.video_id)
            .await?;

        // Step 1
        let media_type = normalize_content_type(&request.content_type);
        if media_type != self.config.supported_content_type {
            tracing::debug!(content_type = %request.content_type, "Rejected upload content type");
            return Err(UploadError::UnsupportedMediaType(request.content_type));
        }

        // Step 2
        let raw = self
            .staging
            .materialize(request.body, self.config.max_upload_size)
            .await?;
        tracing::info!(
            video_id = %record.id,
            size_bytes = raw.size(),
            duration_ms = start.elapsed().as_millis(),
            "Upload staged"
        );

        let result = self.process_staged(record, &raw, &media_type).await;
        raw.release().await;

        match &result {
            Ok(outcome) => tracing::info!(
                video_id = %outcome.video.id,
                key = %outcome.storage_key,
                classification = %outcome.classification,
                size_bytes = outcome.size_bytes,
                duration_ms = start.elapsed().as_millis(),
                "Video upload completed"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                duration_ms = start.elapsed().as_millis(),
                "Video upload failed"
            ),
        }

        result
    }

    /// Steps 3-7 against an already staged raw file. The caller releases `raw`.
    async fn process_staged(
        &self,
        record: Video,
        raw: &StagedFile,
        content_type: &str,
    ) -> Result<UploadOutcome, UploadError> {
        // Step 3
        let stage_start = Instant::now();
        let classification = self.inspector.classify(raw.path()).await?;
        tracing::info!(
            video_id = %record.id,
            classification = %classification,
            duration_ms = stage_start.elapsed().as_millis(),
            "Aspect ratio classified"
        );

        // Step 4
        let stage_start = Instant::now();
        let mut optimized = self.staging.reserve(optimized_path_for(raw.path()));
        let optimized_path = match self.optimizer.optimize(raw.path()).await {
            Ok(path) => path,
            Err(e) => {
                optimized.release().await;
                return Err(e.into());
            }
        };
        if optimized_path.as_path() != optimized.path() {
            optimized.release().await;
            optimized = self.staging.reserve(optimized_path);
        }
        if let Err(e) = optimized.refresh_size().await {
            optimized.release().await;
            return Err(e.into());
        }
        tracing::info!(
            video_id = %record.id,
            size_bytes = optimized.size(),
            duration_ms = stage_start.elapsed().as_millis(),
            "Video optimized for streaming"
        );

        // Steps 5 and 6
        let stored = self
            .store_optimized(&record, &optimized, classification, content_type)
            .await;
        let size_bytes = optimized.size();
        optimized.release().await;
        let storage_key = stored?;

        // Step 7
        let public_url = self.storage.public_url(&storage_key);
        let video = match self.videos.set_video_url(record.id, &public_url).await {
            Ok(video) => video,
            Err(e) => {
                self.discard_orphan(&storage_key).await;
                return Err(UploadError::MetadataCommit(e.to_string()));
            }
        };

        Ok(UploadOutcome {
            video,
            classification,
            storage_key,
            public_url,
            size_bytes,
        })
    }

    async fn store_optimized(
        &self,
        record: &Video,
        optimized: &StagedFile,
        classification: AspectClassification,
        content_type: &str,
    ) -> Result<String, UploadError> {
        let storage_key = derive_video_key(classification);

        let stage_start = Instant::now();
        let file = tokio::fs::File::open(optimized.path())
            .await
            .map_err(UploadError::Staging)?;

        let upload = self.storage.upload_stream(
            &storage_key,
            content_type,
            Some(optimized.size()),
            Box::pin(file),
        );

        match tokio::time::timeout(self.config.upload_timeout, upload).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(
                    error = %e,
                    video_id = %record.id,
                    key = %storage_key,
                    "Object store upload failed"
                );
                return Err(UploadError::Storage(e.to_string()));
            }
            Err(_) => {
                tracing::error!(
                    video_id = %record.id,
                    key = %storage_key,
                    timeout_secs = self.config.upload_timeout.as_secs(),
                    "Object store upload timed out"
                );
                return Err(UploadError::Storage(format!(
                    "upload timed out after {:?}",
                    self.config.upload_timeout
                )));
            }
        }

        tracing::info!(
            video_id = %record.id,
            key = %storage_key,
            size_bytes = optimized.size(),
            duration_ms = stage_start.elapsed().as_millis(),
            "Video stored"
        );

        Ok(storage_key)
    }

    /// Single best-effort delete of an object no record points to.
    async fn discard_orphan(&self, storage_key: &str) {
        match self.storage.delete(storage_key).await {
            Ok(()) => tracing::error!(
                key = %storage_key,
                "Metadata commit failed; removed stored object"
            ),
            Err(e) => tracing::error!(
                error = %e,
                key = %storage_key,
                "Metadata commit failed; stored object is orphaned"
            ),
        }
    }
}
