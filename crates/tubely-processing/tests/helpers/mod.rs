//! Test doubles for the upload pipeline.
//!
//! Run with: `cargo test -p tubely-processing --test pipeline_test`

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tubely_core::{AppError, AspectClassification, Video};
use tubely_db::VideoStore;
use tubely_processing::{
    optimized_path_for, InspectError, MediaInspector, OptimizeError, StagingManager,
    StreamOptimizer, UploadPipeline, UploadPipelineConfig,
};
use tubely_storage::{Storage, StorageBackend, StorageError, StorageResult};
use uuid::Uuid;

pub const TEST_BUCKET: &str = "tubely-videos";
pub const TEST_REGION: &str = "us-east-2";

/// Metadata store kept in a HashMap.
#[derive(Default)]
pub struct MemoryVideoStore {
    videos: Mutex<HashMap<Uuid, Video>>,
    fail_updates: AtomicBool,
}

impl MemoryVideoStore {
    pub fn insert(&self, video: Video) {
        self.videos.lock().unwrap().insert(video.id, video);
    }

    pub fn get(&self, id: Uuid) -> Option<Video> {
        self.videos.lock().unwrap().get(&id).cloned()
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.videos.lock().unwrap().keys().copied().collect()
    }

    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }

    fn modify(&self, id: Uuid, apply: impl FnOnce(&mut Video)) -> Result<Video, AppError> {
        let mut videos = self.videos.lock().unwrap();
        let video = videos
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
        apply(video);
        video.updated_at = Utc::now();
        Ok(video.clone())
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn create_video(&self, video: &Video) -> Result<Video, AppError> {
        self.insert(video.clone());
        Ok(video.clone())
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.get(id))
    }

    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError> {
        let mut videos: Vec<Video> = self
            .videos
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }

    async fn set_video_url(&self, id: Uuid, video_url: &str) -> Result<Video, AppError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Internal("connection reset by peer".to_string()));
        }
        self.modify(id, |video| video.video_url = Some(video_url.to_string()))
    }

    async fn set_thumbnail_url(&self, id: Uuid, thumbnail_url: &str) -> Result<Video, AppError> {
        self.modify(id, |video| video.thumbnail_url = Some(thumbnail_url.to_string()))
    }

    async fn delete_video(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.videos.lock().unwrap().remove(&id).is_some())
    }
}

/// Inspector returning a fixed geometry, or failing.
///
/// With `thumbnail_writer` set, every record gets that thumbnail while the run is
/// being classified, like a thumbnail upload racing the video upload.
pub struct StubInspector {
    pub dimensions: Option<(u32, u32)>,
    pub thumbnail_writer: Option<(Arc<MemoryVideoStore>, String)>,
}

#[async_trait]
impl MediaInspector for StubInspector {
    async fn classify(&self, path: &Path) -> Result<AspectClassification, InspectError> {
        assert!(path.exists(), "inspector called on a missing file");
        if let Some((videos, thumbnail_url)) = &self.thumbnail_writer {
            for id in videos.ids() {
                videos.set_thumbnail_url(id, thumbnail_url).await.unwrap();
            }
        }
        match self.dimensions {
            Some((w, h)) => Ok(AspectClassification::from_dimensions(w, h)),
            None => Err(InspectError::Probe("exited with 1: invalid data".to_string())),
        }
    }
}

/// Optimizer copying its input to the conventional output path, or failing.
///
/// With `hang` set it writes the output and then never returns.
pub struct StubOptimizer {
    pub fail: bool,
    pub hang: bool,
}

#[async_trait]
impl StreamOptimizer for StubOptimizer {
    async fn optimize(&self, input: &Path) -> Result<PathBuf, OptimizeError> {
        if self.fail {
            return Err(OptimizeError::Remux {
                status: "exit status: 1".to_string(),
                stderr: "moov atom not found".to_string(),
            });
        }
        let output = optimized_path_for(input);
        tokio::fs::copy(input, &output)
            .await
            .map_err(OptimizeError::Spawn)?;
        if self.hang {
            std::future::pending::<()>().await;
        }
        Ok(output)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Accept,
    Fail,
    Hang,
}

/// Object store kept in memory, with S3-style public URLs.
pub struct MemoryStorage {
    mode: StoreMode,
    objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
    deleted: Mutex<Vec<String>>,
}

impl MemoryStorage {
    pub fn new(mode: StoreMode) -> Self {
        Self {
            mode,
            objects: Mutex::new(HashMap::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn object(&self, key: &str) -> Option<(String, Vec<u8>)> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upload_stream(
        &self,
        storage_key: &str,
        content_type: &str,
        _content_length: Option<u64>,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<()> {
        match self.mode {
            StoreMode::Fail => Err(StorageError::UploadFailed("503 Slow Down".to_string())),
            StoreMode::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
            StoreMode::Accept => {
                let mut data = Vec::new();
                reader.read_to_end(&mut data).await?;
                self.objects
                    .lock()
                    .unwrap()
                    .insert(storage_key.to_string(), (content_type.to_string(), data));
                Ok(())
            }
        }
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.objects.lock().unwrap().remove(storage_key);
        self.deleted.lock().unwrap().push(storage_key.to_string());
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(storage_key))
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            TEST_BUCKET, TEST_REGION, storage_key
        )
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

/// Reader yielding some bytes and then an I/O error, like a dropped connection.
pub struct BrokenReader {
    sent: bool,
}

impl BrokenReader {
    pub fn new() -> Self {
        Self { sent: false }
    }
}

impl AsyncRead for BrokenReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if self.sent {
            return Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "client went away",
            )));
        }
        self.sent = true;
        buf.put_slice(b"\x00\x00\x00\x18ftypmp42");
        Poll::Ready(Ok(()))
    }
}

/// Knobs for one pipeline under test.
pub struct Harness {
    pub dimensions: Option<(u32, u32)>,
    pub optimizer_fails: bool,
    pub optimizer_hangs: bool,
    pub thumbnail_during_inspect: Option<String>,
    pub store_mode: StoreMode,
    pub max_upload_size: u64,
    pub upload_timeout: Duration,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            dimensions: Some((1920, 1080)),
            optimizer_fails: false,
            optimizer_hangs: false,
            thumbnail_during_inspect: None,
            store_mode: StoreMode::Accept,
            max_upload_size: 1024 * 1024,
            upload_timeout: Duration::from_secs(5),
        }
    }
}

pub struct TestPipeline {
    pub pipeline: UploadPipeline,
    pub videos: Arc<MemoryVideoStore>,
    pub storage: Arc<MemoryStorage>,
    pub staging: StagingManager,
    pub _staging_dir: TempDir,
}

impl TestPipeline {
    /// Insert a draft record owned by `owner` and return its id.
    pub fn draft_for(&self, owner: Uuid) -> Uuid {
        let video = Video::new_draft(owner, "Boot camp".to_string(), String::new());
        let id = video.id;
        self.videos.insert(video);
        id
    }

    /// Files left in the staging directory.
    pub fn staging_residue(&self) -> usize {
        std::fs::read_dir(self.staging.dir()).unwrap().count()
    }

    pub fn assert_no_leaks(&self) {
        assert_eq!(
            self.staging.staged(),
            self.staging.released(),
            "every staged file must be released"
        );
        assert_eq!(self.staging_residue(), 0, "staging directory must be empty");
    }
}

impl Harness {
    pub fn build(self) -> TestPipeline {
        let staging_dir = tempfile::tempdir().unwrap();
        let staging = StagingManager::new(staging_dir.path());
        let videos = Arc::new(MemoryVideoStore::default());
        let storage = Arc::new(MemoryStorage::new(self.store_mode));

        let config = UploadPipelineConfig {
            max_upload_size: self.max_upload_size,
            upload_timeout: self.upload_timeout,
            ..UploadPipelineConfig::default()
        };

        let pipeline = UploadPipeline::new(
            config,
            Arc::new(StubInspector {
                dimensions: self.dimensions,
                thumbnail_writer: self
                    .thumbnail_during_inspect
                    .map(|url| (videos.clone(), url)),
            }),
            Arc::new(StubOptimizer {
                fail: self.optimizer_fails,
                hang: self.optimizer_hangs,
            }),
            storage.clone(),
            videos.clone(),
            staging.clone(),
        );

        TestPipeline {
            pipeline,
            videos,
            storage,
            staging,
            _staging_dir: staging_dir,
        }
    }
}

/// A few bytes that look like the start of an MP4 file.
pub fn sample_mp4() -> Vec<u8> {
    let mut data = b"\x00\x00\x00\x18ftypmp42\x00\x00\x00\x00mp42isom".to_vec();
    data.extend(std::iter::repeat(0xAB).take(4096));
    data
}
