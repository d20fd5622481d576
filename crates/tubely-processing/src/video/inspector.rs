//! Video inspection - stream geometry and aspect classification

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tubely_core::AspectClassification;

#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("failed to run ffprobe: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffprobe failed: {0}")]
    Probe(String),

    #[error("no video stream with positive dimensions")]
    NoVideoStream,
}

/// Classifies a staged file by the geometry of its first video stream.
///
/// Implementations must not modify the file.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    async fn classify(&self, path: &Path) -> Result<AspectClassification, InspectError>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    width: Option<i64>,
    #[serde(default)]
    height: Option<i64>,
}

/// Parse `ffprobe -print_format json -show_streams` output and classify the first
/// stream exposing both a positive width and height.
pub fn classify_probe_output(stdout: &[u8]) -> Result<AspectClassification, InspectError> {
    let probe: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| InspectError::Probe(format!("could not parse ffprobe output: {}", e)))?;

    probe
        .streams
        .iter()
        .find_map(|stream| {
            let width = u32::try_from(stream.width?).ok().filter(|w| *w > 0)?;
            let height = u32::try_from(stream.height?).ok().filter(|h| *h > 0)?;
            Some(AspectClassification::from_dimensions(width, height))
        })
        .ok_or(InspectError::NoVideoStream)
}

pub struct FfprobeInspector {
    ffprobe_path: String,
}

impl FfprobeInspector {
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn classify(&self, path: &Path) -> Result<AspectClassification, InspectError> {
        let start = std::time::Instant::now();

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(InspectError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(
                status = %output.status,
                stderr = %stderr.trim(),
                "ffprobe exited with failure"
            );
            return Err(InspectError::Probe(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let classification = classify_probe_output(&output.stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            classification = %classification,
            "Video probe completed"
        );

        Ok(classification)
    }
}
