//! Ranged record reading from a `StreamSource`
//!
//! `RecordReader` fetches only the header, the field table, and the byte
//! ranges of the records asked for. It suits schema inspection and head/tail
//! peeks where loading the whole file would be wasteful.

use std::sync::Arc;

use tracing::debug;

use crate::error::ReaderError;
use crate::schema::{parse_fields, Schema};
use crate::source::StreamSource;

use super::codec::{decode_record_at, is_deleted, Record};
use super::header::{DbfHeader, HEADER_SIZE};

/// Reads records on demand from a byte-range source.
pub struct RecordReader<S: StreamSource> {
    source: S,
    header: DbfHeader,
    schema: Arc<Schema>,
}

impl<S: StreamSource> RecordReader<S> {
    /// Read the header and field table from `source`.
    ///
    /// # Errors
    /// - `ReaderError::Source` if the source cannot be read
    /// - `ReaderError::MalformedHeader` / `ReaderError::SchemaMismatch` as for
    ///   [`DbfFile::from_bytes`](super::DbfFile::from_bytes)
    pub async fn open(source: S) -> Result<Self, ReaderError> {
        let fixed = source.read_range(0, HEADER_SIZE).await?;
        let header = DbfHeader::parse(&fixed)?;

        let prefix = source.read_range(0, header.header_length as usize).await?;
        let schema = Arc::new(parse_fields(&prefix, &header)?);

        debug!(
            records = header.record_count,
            fields = schema.len(),
            "Read DBF header and field table"
        );

        Ok(Self {
            source,
            header,
            schema,
        })
    }

    /// The parsed header.
    pub fn header(&self) -> &DbfHeader {
        &self.header
    }

    /// The field schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Consume the reader, returning the source.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Number of records fully present in the source.
    pub async fn readable_records(&self) -> Result<u32, ReaderError> {
        let size = self.source.size().await?;
        Ok(self.header.readable_records(size))
    }

    /// Read up to `count` records starting at `start`, skipping deleted ones.
    ///
    /// The range is clamped to the declared record count. If the source ends
    /// early, the records that were fully read are returned.
    ///
    /// # Arguments
    /// * `start` - Index of the first record to read
    /// * `count` - Maximum number of record slots to read
    ///
    /// # Returns
    /// Non-deleted records in file order, each carrying its file index.
    pub async fn read_records(&self, start: u32, count: u32) -> Result<Vec<Record>, ReaderError> {
        let end = start
            .saturating_add(count)
            .min(self.header.record_count);
        if start >= end {
            return Ok(Vec::new());
        }

        let record_length = self.header.record_length;
        let wanted = (end - start) as usize * record_length as usize;
        let data = self
            .source
            .read_range(self.header.record_offset(start), wanted)
            .await?;

        let complete = (data.len() / record_length as usize) as u32;
        if complete < end - start {
            debug!(
                start,
                requested = end - start,
                received = complete,
                "Source ended before the requested records"
            );
        }

        let records = (0..complete)
            .filter_map(|i| {
                let offset = i as u64 * record_length as u64;
                if is_deleted(&data, offset) {
                    return None;
                }
                decode_record_at(&data, offset, record_length, start + i, &self.schema)
            })
            .collect();

        Ok(records)
    }

    /// Read a single record. Returns `None` if it is deleted or unreadable.
    pub async fn read_record(&self, index: u32) -> Result<Option<Record>, ReaderError> {
        Ok(self.read_records(index, 1).await?.pop())
    }

    /// The first `n` record slots, minus deleted records.
    pub async fn head(&self, n: u32) -> Result<Vec<Record>, ReaderError> {
        self.read_records(0, n).await
    }

    /// The last `n` readable record slots, minus deleted records.
    pub async fn tail(&self, n: u32) -> Result<Vec<Record>, ReaderError> {
        let readable = self.readable_records().await?;
        let start = readable.saturating_sub(n);
        self.read_records(start, readable - start).await
    }
}
