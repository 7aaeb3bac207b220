//! Local filesystem source implementation
//!
//! Provides positioned reads over a DBF file on disk, so single records can
//! be fetched without loading a multi-hundred-megabyte file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio::sync::Mutex;
use tracing::debug;

use super::traits::StreamSource;
use crate::error::SourceError;

/// A data source for reading from local filesystem.
///
/// Uses tokio's async file I/O with seek + read for positioned reads.
pub struct LocalSource {
    /// The file handle wrapped in a mutex for safe concurrent access
    file: Mutex<File>,
    /// Path to the file (for error reporting)
    path: PathBuf,
    /// Cached file size
    file_size: u64,
}

impl LocalSource {
    /// Open a local file for reading.
    ///
    /// # Errors
    /// Returns `SourceError::NotFound` if the file doesn't exist.
    /// Returns `SourceError::PermissionDenied` if access is denied.
    /// Returns `SourceError::FileSystemError` for other I/O errors.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();

        let file = File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::NotFound(path.display().to_string())
            } else if e.kind() == std::io::ErrorKind::PermissionDenied {
                SourceError::PermissionDenied(path.display().to_string())
            } else {
                SourceError::FileSystemError(format!("{}: {}", path.display(), e))
            }
        })?;

        let metadata = file.metadata().await.map_err(|e| {
            SourceError::FileSystemError(format!(
                "Failed to get metadata for {}: {}",
                path.display(),
                e
            ))
        })?;

        let file_size = metadata.len();
        debug!(path = %path.display(), size_bytes = file_size, "Opened local DBF file");

        Ok(Self {
            file: Mutex::new(file),
            path,
            file_size,
        })
    }

    /// Get the path to the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StreamSource for LocalSource {
    async fn read_range(&self, offset: u64, length: usize) -> Result<Bytes, SourceError> {
        if offset >= self.file_size || length == 0 {
            return Ok(Bytes::new());
        }

        // Clamp length to not exceed file bounds
        let available = (self.file_size - offset).min(usize::MAX as u64) as usize;
        let actual_length = length.min(available);

        let mut file = self.file.lock().await;

        file.seek(SeekFrom::Start(offset)).await.map_err(|e| {
            SourceError::FileSystemError(format!(
                "Failed to seek to offset {} in {}: {}",
                offset,
                self.path.display(),
                e
            ))
        })?;

        let mut buffer = vec![0u8; actual_length];
        let mut filled = 0;
        // The file may have shrunk since it was opened; stop at EOF instead of failing.
        while filled < actual_length {
            let n = file.read(&mut buffer[filled..]).await.map_err(|e| {
                SourceError::FileSystemError(format!(
                    "Failed to read {} bytes at offset {} from {}: {}",
                    actual_length,
                    offset,
                    self.path.display(),
                    e
                ))
            })?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buffer.truncate(filled);

        Ok(Bytes::from(buffer))
    }

    async fn size(&self) -> Result<u64, SourceError> {
        Ok(self.file_size)
    }

    async fn read_from(&self, offset: u64) -> Result<Bytes, SourceError> {
        if offset >= self.file_size {
            return Ok(Bytes::new());
        }

        let length = (self.file_size - offset) as usize;
        self.read_range(offset, length).await
    }
}

impl std::fmt::Debug for LocalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSource")
            .field("path", &self.path)
            .field("file_size", &self.file_size)
            .finish()
    }
}
