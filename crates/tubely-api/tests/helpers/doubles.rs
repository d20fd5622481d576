//! In-memory metadata store and stubbed media tools.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tubely_core::{AppError, AspectClassification, Video};
use tubely_db::VideoStore;
use tubely_processing::{
    optimized_path_for, InspectError, MediaInspector, OptimizeError, StreamOptimizer,
};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryVideoStore {
    videos: Mutex<HashMap<Uuid, Video>>,
}

impl MemoryVideoStore {
    pub fn get(&self, id: Uuid) -> Option<Video> {
        self.videos.lock().unwrap().get(&id).cloned()
    }

    pub fn insert(&self, video: Video) {
        self.videos.lock().unwrap().insert(video.id, video);
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
        self.modify(id, |video| video.video_url = Some(video_url.to_string()))
    }

    async fn set_thumbnail_url(&self, id: Uuid, thumbnail_url: &str) -> Result<Video, AppError> {
        self.modify(id, |video| video.thumbnail_url = Some(thumbnail_url.to_string()))
    }

    async fn delete_video(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.videos.lock().unwrap().remove(&id).is_some())
    }
}

/// Inspector returning a fixed geometry, or failing like ffprobe on garbage input.
pub struct StubInspector {
    pub dimensions: Option<(u32, u32)>,
}

#[async_trait]
impl MediaInspector for StubInspector {
    async fn classify(&self, _path: &Path) -> Result<AspectClassification, InspectError> {
        match self.dimensions {
            Some((w, h)) => Ok(AspectClassification::from_dimensions(w, h)),
            None => Err(InspectError::Probe("Invalid data found when processing input".to_string())),
        }
    }
}

/// Optimizer that copies its input to the conventional output path.
pub struct CopyOptimizer;

#[async_trait]
impl StreamOptimizer for CopyOptimizer {
    async fn optimize(&self, input: &Path) -> Result<PathBuf, OptimizeError> {
        let output = optimized_path_for(input);
        tokio::fs::copy(input, &output)
            .await
            .map_err(OptimizeError::Spawn)?;
        Ok(output)
    }
}
