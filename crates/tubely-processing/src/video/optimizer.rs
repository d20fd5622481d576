//! Faststart remuxing
//!
//! Moves the MP4 `moov` atom ahead of the media data with a stream copy, so browsers
//! can start playback before the whole file has downloaded. No samples are re-encoded.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Suffix appended to the input path to name the remuxed output.
const OPTIMIZED_SUFFIX: &str = ".processing";

#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    #[error("failed to run ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffmpeg remux failed ({status}): {stderr}")]
    Remux { status: String, stderr: String },
}

/// Produces a progressive-playback copy of a staged file.
///
/// The output is written next to the input and never replaces it. The caller owns
/// both paths afterwards.
#[async_trait]
pub trait StreamOptimizer: Send + Sync {
    async fn optimize(&self, input: &Path) -> Result<PathBuf, OptimizeError>;
}

/// Where the optimized copy of `input` is written.
pub fn optimized_path_for(input: &Path) -> PathBuf {
    let mut os: OsString = input.as_os_str().to_owned();
    os.push(OPTIMIZED_SUFFIX);
    PathBuf::from(os)
}

pub struct FfmpegOptimizer {
    ffmpeg_path: String,
}

impl FfmpegOptimizer {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

#[async_trait]
impl StreamOptimizer for FfmpegOptimizer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn optimize(&self, input: &Path) -> Result<PathBuf, OptimizeError> {
        let start = std::time::Instant::now();
        let output_path = optimized_path_for(input);

        let output = Command::new(&self.ffmpeg_path)
            .arg("-i")
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(&output_path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(OptimizeError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            // ffmpeg may leave a truncated output behind
            if let Err(e) = tokio::fs::remove_file(&output_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        error = %e,
                        path = %output_path.display(),
                        "Failed to remove partial ffmpeg output"
                    );
                }
            }
            tracing::warn!(
                status = %output.status,
                stderr = %stderr,
                "ffmpeg remux failed"
            );
            return Err(OptimizeError::Remux {
                status: output.status.to_string(),
                stderr,
            });
        }

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            output = %output_path.display(),
            "Faststart remux completed"
        );

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimized_path_appends_suffix() {
        let input = Path::new("/tmp/tubely-upload-abc.mp4");
        assert_eq!(
            optimized_path_for(input),
            PathBuf::from("/tmp/tubely-upload-abc.mp4.processing")
        );
        assert_ne!(optimized_path_for(input), input);
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let optimizer = FfmpegOptimizer::new("/nonexistent/ffmpeg-binary");
        let result = optimizer.optimize(Path::new("/tmp/whatever.mp4")).await;
        assert!(matches!(result, Err(OptimizeError::Spawn(_))));
    }

    /// Write an executable shell script standing in for ffmpeg. The output path is
    /// its last argument.
    #[cfg(unix)]
    fn stub_binary(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("ffmpeg");
        let script = format!("#!/bin/sh\nfor last; do :; done\n{}\n", body);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_remux_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tubely-upload-abc.mp4");
        std::fs::write(&input, b"not really an mp4").unwrap();
        let ffmpeg = stub_binary(
            dir.path(),
            ": > \"$last\"\necho 'moov atom not found' >&2\nexit 1",
        );

        let result = FfmpegOptimizer::new(ffmpeg).optimize(&input).await;

        match result {
            Err(OptimizeError::Remux { status, stderr }) => {
                assert_eq!(stderr, "moov atom not found");
                assert!(status.contains('1'));
            }
            other => panic!("expected a remux error, got {:?}", other),
        }
        assert!(!optimized_path_for(&input).exists());
        assert!(input.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_remux_returns_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tubely-upload-abc.mp4");
        std::fs::write(&input, b"mp4 bytes").unwrap();
        let ffmpeg = stub_binary(dir.path(), "echo remuxed > \"$last\"");

        let output = FfmpegOptimizer::new(ffmpeg).optimize(&input).await.unwrap();

        assert_eq!(output, optimized_path_for(&input));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "remuxed\n");
    }
}
