//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p tubely-api`. No database or ffmpeg needed:
//! the metadata store is in memory, storage is a LocalStorage in a temp dir and the
//! media tools are stubbed.

#![allow(dead_code)]

pub mod auth;
pub mod doubles;
pub mod fixtures;

use axum_test::TestServer;
use doubles::{CopyOptimizer, MemoryVideoStore, StubInspector};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tubely_api::constants;
use tubely_api::setup::routes;
use tubely_api::state::{AppState, UploadLimits};
use tubely_core::{BaseConfig, Config, StorageBackend, UploadServiceConfig, Video};
use tubely_processing::{StagingManager, UploadPipeline, UploadPipelineConfig};
use tubely_storage::{LocalStorage, Storage};
use uuid::Uuid;

pub const TEST_MEDIA_BASE_URL: &str = "http://localhost:8091/media";

/// API path under the `/api` prefix.
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Knobs for one test app.
pub struct TestOptions {
    pub dimensions: Option<(u32, u32)>,
    pub max_video_size_bytes: u64,
    pub max_thumbnail_size_bytes: u64,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            dimensions: Some((1920, 1080)),
            max_video_size_bytes: 1024 * 1024,
            max_thumbnail_size_bytes: 64 * 1024,
        }
    }
}

/// Test application: server plus the collaborators behind it.
pub struct TestApp {
    pub server: TestServer,
    pub videos: Arc<MemoryVideoStore>,
    pub storage: Arc<LocalStorage>,
    pub staging: StagingManager,
    pub _media_dir: TempDir,
    pub _staging_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Insert a draft owned by `owner` directly into the store.
    pub fn seed_video(&self, owner: Uuid) -> Video {
        let video = Video::new_draft(owner, "Boot camp".to_string(), "Day one".to_string());
        self.videos.insert(video.clone());
        video
    }

    /// Files left behind in the staging directory.
    pub fn staging_residue(&self) -> usize {
        std::fs::read_dir(self.staging.dir()).unwrap().count()
    }
}

pub fn test_config(options: &TestOptions, media_dir: &TempDir, staging_dir: &TempDir) -> Config {
    Config(Box::new(UploadServiceConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 1,
            db_timeout_seconds: 1,
            http_concurrency_limit: 16,
            jwt_secret: auth::TEST_JWT_SECRET.to_string(),
            environment: "test".to_string(),
        },
        database_url: "postgres://unused@localhost/tubely_test".to_string(),
        storage_backend: Some(StorageBackend::Local),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: Some(media_dir.path().to_string_lossy().to_string()),
        local_storage_base_url: Some(TEST_MEDIA_BASE_URL.to_string()),
        max_video_size_bytes: options.max_video_size_bytes,
        max_thumbnail_size_bytes: options.max_thumbnail_size_bytes,
        upload_timeout_secs: 5,
        ffmpeg_path: "ffmpeg".to_string(),
        ffprobe_path: "ffprobe".to_string(),
        upload_temp_dir: Some(staging_dir.path().to_path_buf()),
    }))
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestOptions::default()).await
}

pub async fn setup_test_app_with(options: TestOptions) -> TestApp {
    let media_dir = tempfile::tempdir().expect("Failed to create media dir");
    let staging_dir = tempfile::tempdir().expect("Failed to create staging dir");
    let config = test_config(&options, &media_dir, &staging_dir);

    let videos = Arc::new(MemoryVideoStore::default());
    let storage = Arc::new(
        LocalStorage::new(media_dir.path(), TEST_MEDIA_BASE_URL.to_string())
            .await
            .expect("Failed to create local storage"),
    );
    let staging = StagingManager::new(staging_dir.path());

    let pipeline = UploadPipeline::new(
        UploadPipelineConfig {
            max_upload_size: config.max_video_size_bytes(),
            upload_timeout: Duration::from_secs(config.upload_timeout_secs()),
            ..UploadPipelineConfig::default()
        },
        Arc::new(StubInspector {
            dimensions: options.dimensions,
        }),
        Arc::new(CopyOptimizer),
        storage.clone() as Arc<dyn Storage>,
        videos.clone(),
        staging.clone(),
    );

    let state = Arc::new(AppState {
        videos: videos.clone(),
        storage: storage.clone(),
        pipeline: Arc::new(pipeline),
        limits: UploadLimits {
            max_video_size_bytes: config.max_video_size_bytes(),
            max_thumbnail_size_bytes: config.max_thumbnail_size_bytes(),
        },
    });

    let app = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        videos,
        storage,
        staging,
        _media_dir: media_dir,
        _staging_dir: staging_dir,
    }
}
