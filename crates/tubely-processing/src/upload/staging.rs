//! Request-scoped temp files.
//!
//! Every file the pipeline writes to local disk is a [`StagedFile`]. A staged file is
//! released exactly once: explicitly through [`StagedFile::release`], or by `Drop` when
//! the owning future is cancelled or unwinds before it gets there.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

const STAGING_PREFIX: &str = "tubely-upload-";
const STAGING_SUFFIX: &str = ".mp4";
const COPY_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("failed to read upload body: {0}")]
    Read(#[source] io::Error),

    #[error("staging file error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Default)]
struct StagingCounters {
    staged: AtomicUsize,
    released: AtomicUsize,
}

/// Creates and tracks staged files under one directory.
///
/// Cloning is cheap; clones share the same counters.
#[derive(Debug, Clone)]
pub struct StagingManager {
    dir: PathBuf,
    counters: Arc<StagingCounters>,
}

impl StagingManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counters: Arc::new(StagingCounters::default()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of staged files created so far.
    pub fn staged(&self) -> usize {
        self.counters.staged.load(Ordering::SeqCst)
    }

    /// Number of staged files released so far.
    pub fn released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    /// Copy `reader` into a fresh, uniquely named temp file.
    ///
    /// Reading stops one byte past `size_limit`; a body larger than the limit fails with
    /// [`StagingError::TooLarge`] and the partial file is removed before returning.
    pub async fn materialize<R>(&self, mut reader: R, size_limit: u64) -> Result<StagedFile, StagingError>
    where
        R: AsyncRead + Unpin,
    {
        let named = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&self.dir)?;
        let (std_file, path) = named.keep().map_err(io::Error::from)?;
        let mut staged = self.track(path);

        let mut file = tokio::fs::File::from_std(std_file);
        let copied = async {
            let mut buf = vec![0u8; COPY_BUFFER_SIZE];
            let mut written: u64 = 0;
            loop {
                let n = reader.read(&mut buf).await.map_err(StagingError::Read)?;
                if n == 0 {
                    break;
                }
                written += n as u64;
                if written > size_limit {
                    return Err(StagingError::TooLarge { limit: size_limit });
                }
                file.write_all(&buf[..n]).await?;
            }
            file.flush().await?;
            Ok::<u64, StagingError>(written)
        }
        .await;
        drop(file);

        match copied {
            Ok(size) => {
                staged.size = size;
                tracing::debug!(
                    path = %staged.path.display(),
                    size_bytes = size,
                    "Upload staged"
                );
                Ok(staged)
            }
            Err(e) => {
                staged.release().await;
                Err(e)
            }
        }
    }

    /// Track `path` before another component writes it.
    ///
    /// The file does not need to exist yet. Dropping or releasing the guard removes
    /// whatever was written there, including partial output from a cancelled run.
    pub fn reserve(&self, path: PathBuf) -> StagedFile {
        self.track(path)
    }

    fn track(&self, path: PathBuf) -> StagedFile {
        self.counters.staged.fetch_add(1, Ordering::SeqCst);
        StagedFile {
            path,
            size: 0,
            counters: self.counters.clone(),
            released: false,
        }
    }
}

/// A temp file owned by one pipeline run.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    size: u64,
    counters: Arc<StagingCounters>,
    released: bool,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Re-read the size of the backing file after it has been written.
    pub async fn refresh_size(&mut self) -> Result<u64, StagingError> {
        self.size = tokio::fs::metadata(&self.path).await?.len();
        Ok(self.size)
    }

    /// Delete the backing file. A file that is already gone counts as released.
    pub async fn release(mut self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(
                    error = %e,
                    path = %self.path.display(),
                    "Failed to remove staged file"
                );
            }
        }
        self.mark_released();
    }

    fn mark_released(&mut self) {
        if !self.released {
            self.released = true;
            self.counters.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(
                    error = %e,
                    path = %self.path.display(),
                    "Failed to remove staged file on drop"
                );
            }
        }
        self.mark_released();
    }
}
