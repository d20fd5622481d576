//! Upload pipeline: validate → stage → classify → optimize → store → commit.

pub mod pipeline;
pub mod staging;
pub mod types;

pub use pipeline::{normalize_content_type, UploadPipeline, UploadPipelineConfig};
pub use staging::{StagedFile, StagingError, StagingManager};
pub use types::{UploadError, UploadOutcome, UploadRequest};
