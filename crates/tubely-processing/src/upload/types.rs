//! Types for the upload pipeline.

use crate::upload::staging::StagingError;
use crate::video::{InspectError, OptimizeError};
use tubely_core::constants::SUPPORTED_VIDEO_CONTENT_TYPE;
use tubely_core::{AppError, AspectClassification, Video};
use uuid::Uuid;

/// One inbound video upload.
///
/// `body` is read once, front to back.
pub struct UploadRequest<R> {
    pub owner_id: Uuid,
    pub video_id: Uuid,
    pub content_type: String,
    pub body: R,
}

/// Result of a successful pipeline run.
#[derive(Clone, Debug)]
pub struct UploadOutcome {
    pub video: Video,
    pub classification: AspectClassification,
    pub storage_key: String,
    pub public_url: String,
    pub size_bytes: u64,
}

/// Failure of a pipeline run, tagged by the stage that produced it.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("video {0} not found")]
    NotFound(Uuid),

    #[error("user {user_id} does not own video {video_id}")]
    Forbidden { user_id: Uuid, video_id: Uuid },

    #[error("unsupported content type: {0}")]
    UnsupportedMediaType(String),

    #[error("upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: u64 },

    #[error("could not read upload body: {0}")]
    BodyRead(#[source] std::io::Error),

    #[error("staging failed: {0}")]
    Staging(#[source] std::io::Error),

    #[error("inspection failed: {0}")]
    Inspect(#[from] InspectError),

    #[error("optimization failed: {0}")]
    Optimize(#[from] OptimizeError),

    #[error("storage upload failed: {0}")]
    Storage(String),

    #[error("metadata commit failed: {0}")]
    MetadataCommit(String),

    #[error("metadata lookup failed: {0}")]
    Lookup(#[source] AppError),
}

impl From<StagingError> for UploadError {
    fn from(err: StagingError) -> Self {
        match err {
            StagingError::TooLarge { limit } => UploadError::PayloadTooLarge { limit },
            StagingError::Read(e) => UploadError::BodyRead(e),
            StagingError::Io(e) => UploadError::Staging(e),
        }
    }
}

impl UploadError {
    /// Whether the failure came from ffprobe or ffmpeg.
    pub fn is_processing(&self) -> bool {
        matches!(self, UploadError::Inspect(_) | UploadError::Optimize(_))
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::NotFound(_) => AppError::NotFound("Video not found".to_string()),
            UploadError::Forbidden { .. } => {
                AppError::Forbidden("You do not own this video".to_string())
            }
            UploadError::UnsupportedMediaType(content_type) => AppError::UnsupportedMediaType(
                format!(
                    "Unsupported content type '{}', expected {}",
                    content_type, SUPPORTED_VIDEO_CONTENT_TYPE
                ),
            ),
            UploadError::PayloadTooLarge { limit } => AppError::PayloadTooLarge(format!(
                "Video exceeds the maximum upload size of {} bytes",
                limit
            )),
            UploadError::BodyRead(e) => {
                AppError::BadRequest(format!("Failed to read upload body: {}", e))
            }
            UploadError::Staging(e) => AppError::Internal(format!("Failed to stage upload: {}", e)),
            e @ (UploadError::Inspect(_) | UploadError::Optimize(_)) => {
                AppError::Processing(e.to_string())
            }
            UploadError::Storage(msg) => AppError::Storage(msg),
            UploadError::MetadataCommit(msg) => AppError::MetadataCommit(msg),
            UploadError::Lookup(e) => e,
        }
    }
}
