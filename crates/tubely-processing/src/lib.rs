//! Tubely media processing
//!
//! Everything between the inbound upload stream and a committed video URL:
//! ffprobe-based aspect classification, ffmpeg faststart remuxing, request-scoped
//! temp-file staging and the upload pipeline that ties them together.

pub mod upload;
pub mod video;

pub use upload::{
    normalize_content_type, StagedFile, StagingError, StagingManager, UploadError,
    UploadOutcome, UploadPipeline, UploadPipelineConfig, UploadRequest,
};
pub use video::{
    optimized_path_for, FfmpegOptimizer, FfprobeInspector, InspectError, MediaInspector,
    OptimizeError, StreamOptimizer,
};
