//! Storage setup and initialization

use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_storage::Storage;

/// Build the object store selected by `STORAGE_BACKEND`
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = tubely_storage::create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    tracing::info!(
        backend = ?storage.backend_type(),
        bucket = config.s3_bucket().unwrap_or_default(),
        "Storage initialized"
    );

    Ok(storage)
}
