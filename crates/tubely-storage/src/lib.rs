//! Tubely Storage Library
//!
//! This crate provides the durable object store abstraction and its implementations
//! for S3 (and S3-compatible providers) and the local filesystem.
//!
//! # Storage key format
//!
//! Video keys are `{orientation}/{random}.mp4`, where `orientation` is one of
//! `landscape`, `portrait` or `other` and `random` is 32 random bytes encoded as
//! unpadded URL-safe base64. Key generation lives in the `keys` module so every
//! caller derives keys the same way.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{derive_video_key, key_prefix};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use tubely_core::StorageBackend;
