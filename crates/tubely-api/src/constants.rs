//! API constants

/// API base path prefix
pub const API_PREFIX: &str = "/api";

/// Multipart field carrying the video file.
pub const VIDEO_FIELD: &str = "video";

/// Multipart field carrying the thumbnail image.
pub const THUMBNAIL_FIELD: &str = "thumbnail";

/// Headroom on top of the largest accepted file for multipart framing.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;
