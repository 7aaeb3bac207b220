//! In-memory source implementation
//!
//! Serves positioned reads from a buffer that is already fully materialized,
//! such as a finished HTTP download or a synthetic test file.

use async_trait::async_trait;
use bytes::Bytes;

use super::traits::StreamSource;
use crate::error::SourceError;

/// A data source backed by an immutable in-memory buffer.
///
/// Reads are zero-copy slices of the underlying `Bytes`.
#[derive(Clone)]
pub struct MemorySource {
    data: Bytes,
}

impl MemorySource {
    /// Wrap an existing buffer.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Borrow the whole buffer.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Consume the source and return its buffer.
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

/// Slice `length` bytes at `offset`, clamped to the end of `data`.
pub(crate) fn clamped_slice(data: &Bytes, offset: u64, length: usize) -> Bytes {
    let len = data.len() as u64;
    if offset >= len {
        return Bytes::new();
    }
    let start = offset as usize;
    let end = start + length.min((len - offset) as usize);
    data.slice(start..end)
}

#[async_trait]
impl StreamSource for MemorySource {
    async fn read_range(&self, offset: u64, length: usize) -> Result<Bytes, SourceError> {
        Ok(clamped_slice(&self.data, offset, length))
    }

    async fn size(&self) -> Result<u64, SourceError> {
        Ok(self.data.len() as u64)
    }

    async fn read_from(&self, offset: u64) -> Result<Bytes, SourceError> {
        Ok(clamped_slice(&self.data, offset, usize::MAX))
    }
}

impl std::fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySource")
            .field("len", &self.data.len())
            .finish()
    }
}
