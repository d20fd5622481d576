//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable object store.
///
/// The upload pipeline writes finished videos through this trait and never touches a
/// concrete backend. Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stream `reader` to `storage_key`, tagging the object with `content_type`.
    ///
    /// The reader is consumed until EOF. Cancellation is by dropping the future;
    /// backends must not leave a visible object behind when that happens.
    async fn upload_stream(
        &self,
        storage_key: &str,
        content_type: &str,
        content_length: Option<u64>,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<()>;

    /// Delete an object by its storage key
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Publicly reachable URL of the object stored under `storage_key`
    fn public_url(&self, storage_key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Recover the storage key from a URL produced by [`Storage::public_url`].
    ///
    /// Returns `None` for URLs that point elsewhere.
    fn key_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_url(""))
            .filter(|key| !key.is_empty())
            .map(String::from)
    }
}
