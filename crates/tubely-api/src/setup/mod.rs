//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod database;
pub mod processing;
pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use crate::state::{AppState, UploadLimits};
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::{VideoRepository, VideoStore};

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    // Setup database
    let pool = database::setup_database(&config).await?;
    let videos: Arc<dyn VideoStore> = Arc::new(VideoRepository::new(pool));

    // Setup storage
    let storage = storage::setup_storage(&config).await?;

    // Upload pipeline (ffprobe, ffmpeg, staging)
    let pipeline = processing::setup_pipeline(&config, storage.clone(), videos.clone()).await?;

    let state = Arc::new(AppState {
        videos,
        storage,
        pipeline,
        limits: UploadLimits {
            max_video_size_bytes: config.max_video_size_bytes(),
            max_thumbnail_size_bytes: config.max_thumbnail_size_bytes(),
        },
    });

    // Setup routes
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
