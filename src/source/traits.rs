//! StreamSource trait definition
//!
//! Provides a unified async interface for positioned reads over DBF bytes.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::SourceError;

/// Abstraction over data sources with positioned, random-access reads.
///
/// Implemented for local files (seek + read), for downloads that were fully
/// buffered in memory, and for plain in-memory buffers, so header parsing and
/// record scanning never care where the bytes came from.
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Read bytes from a specific offset with a given length.
    ///
    /// # Arguments
    /// * `offset` - The byte offset to start reading from
    /// * `length` - The number of bytes to read
    ///
    /// # Returns
    /// Exactly `length` bytes, or fewer when the source ends first. An offset
    /// at or past the end yields an empty buffer. Callers treat a short read
    /// as "no more data", never as an error.
    ///
    /// # Errors
    /// Returns `SourceError` if the source is not accessible or an I/O
    /// error occurs.
    async fn read_range(&self, offset: u64, length: usize) -> Result<Bytes, SourceError>;

    /// Get the total size of the data source in bytes.
    async fn size(&self) -> Result<u64, SourceError>;

    /// Read all bytes from a specific offset to the end of the source.
    ///
    /// Returns an empty buffer when `offset` is at or past the end.
    async fn read_from(&self, offset: u64) -> Result<Bytes, SourceError>;
}

/// A boxed StreamSource for dynamic dispatch
pub type BoxedSource = Box<dyn StreamSource>;

/// Implement StreamSource for BoxedSource to allow using it with generic code
#[async_trait]
impl StreamSource for BoxedSource {
    async fn read_range(&self, offset: u64, length: usize) -> Result<Bytes, SourceError> {
        (**self).read_range(offset, length).await
    }

    async fn size(&self) -> Result<u64, SourceError> {
        (**self).size().await
    }

    async fn read_from(&self, offset: u64) -> Result<Bytes, SourceError> {
        (**self).read_from(offset).await
    }
}
