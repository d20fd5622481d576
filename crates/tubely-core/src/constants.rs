//! Constants shared across crates.

/// Hard ceiling for a single video upload (1 GiB).
pub const MAX_VIDEO_UPLOAD_BYTES: u64 = 1 << 30;

/// Ceiling for thumbnail uploads (10 MiB).
pub const MAX_THUMBNAIL_UPLOAD_BYTES: u64 = 10 << 20;

/// Per-upload deadline for the durable store `put`.
pub const UPLOAD_TIMEOUT_SECS: u64 = 5 * 60;

/// Length of the random suffix in object keys, before encoding.
pub const OBJECT_KEY_RANDOM_BYTES: usize = 32;

/// Extension appended to every stored video key.
pub const VIDEO_KEY_EXTENSION: &str = ".mp4";

/// The only video container accepted by the upload pipeline.
pub const SUPPORTED_VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Image types accepted for thumbnails.
pub const SUPPORTED_THUMBNAIL_CONTENT_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Maximum distance between a measured ratio and 16:9 / 9:16 to still count as that ratio.
pub const ASPECT_RATIO_TOLERANCE: f64 = 0.1;
