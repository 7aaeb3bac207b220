//! Loaded DBF file handle
//!
//! `DbfFile` bundles the parsed header, the schema, and the immutable byte
//! buffer of one file. It is passed explicitly to every scan, decode, and
//! export operation, so several files can be open at once and tests can work
//! on synthetic buffers.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use crate::error::ReaderError;
use crate::schema::{parse_fields, FieldDescriptor, Schema};
use crate::source::{LocalSource, StreamSource};

use super::codec::{decode_record, is_deleted, Record};
use super::header::DbfHeader;

/// An opened DBF file held in memory.
///
/// Cloning is cheap: the buffer and schema are reference counted.
#[derive(Debug, Clone)]
pub struct DbfFile {
    header: DbfHeader,
    schema: Arc<Schema>,
    data: Bytes,
}

impl DbfFile {
    /// Parse a complete DBF file from memory.
    ///
    /// A buffer shorter than the header claims is accepted; records past the
    /// end are simply unreachable (see [`DbfFile::readable_records`]).
    ///
    /// # Errors
    /// - `ReaderError::MalformedHeader` if the fixed header or field table is
    ///   cut short or structurally invalid
    /// - `ReaderError::SchemaMismatch` if the field table disagrees with the
    ///   declared lengths
    pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self, ReaderError> {
        let data = data.into();
        let header = DbfHeader::parse(&data)?;
        let schema = Arc::new(parse_fields(&data, &header)?);

        let file = Self {
            header,
            schema,
            data,
        };

        info!(
            version = header.version,
            records = header.record_count,
            header_length = header.header_length,
            record_length = header.record_length,
            fields = file.schema.len(),
            "Opened DBF file"
        );

        if file.is_truncated() {
            warn!(
                declared_records = header.record_count,
                readable_records = file.readable_records(),
                declared_bytes = header.declared_size(),
                actual_bytes = file.data.len(),
                "DBF file is shorter than its header claims"
            );
        }

        Ok(file)
    }

    /// Read an entire source into memory and parse it.
    pub async fn open<S: StreamSource + ?Sized>(source: &S) -> Result<Self, ReaderError> {
        let data = source.read_from(0).await?;
        Self::from_bytes(data)
    }

    /// Read a local file into memory and parse it.
    pub async fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, ReaderError> {
        let source = LocalSource::open(path).await?;
        Self::open(&source).await
    }

    /// The parsed header.
    pub fn header(&self) -> &DbfHeader {
        &self.header
    }

    /// The field schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The whole file buffer.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.schema.field(name)
    }

    /// Number of records declared by the header.
    pub fn record_count(&self) -> u32 {
        self.header.record_count
    }

    /// Number of records fully present in the buffer.
    pub fn readable_records(&self) -> u32 {
        self.header.readable_records(self.data.len() as u64)
    }

    /// Whether the buffer ends before the last declared record.
    pub fn is_truncated(&self) -> bool {
        self.readable_records() < self.header.record_count
    }

    /// Whether record `index` is flagged deleted, or `None` if it is not readable.
    pub fn is_deleted(&self, index: u32) -> Option<bool> {
        (index < self.readable_records())
            .then(|| is_deleted(&self.data, self.header.record_offset(index)))
    }

    /// Decode record `index`, or `None` if it is not fully readable.
    ///
    /// Deleted records are decoded too; use [`DbfFile::is_deleted`] or a
    /// scan to skip them.
    pub fn record(&self, index: u32) -> Option<Record> {
        if index >= self.header.record_count {
            return None;
        }
        decode_record(&self.data, index, &self.schema, &self.header)
    }

    /// Decode record `index`, reporting an unreachable record as an error.
    ///
    /// # Errors
    /// `ReaderError::TruncatedRecord` when the record lies past the end of
    /// the buffer or past the declared record count.
    pub fn record_strict(&self, index: u32) -> Result<Record, ReaderError> {
        self.record(index).ok_or(ReaderError::TruncatedRecord {
            index,
            offset: self.header.record_offset(index),
        })
    }

    /// Iterate over readable, non-deleted records in file order.
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        (0..self.readable_records())
            .filter(move |&i| !is_deleted(&self.data, self.header.record_offset(i)))
            .filter_map(move |i| self.record(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::source::MemorySource;
    use crate::test_support::{sales_file, DbfFixture};

    #[test]
    fn test_from_bytes() {
        let file = DbfFile::from_bytes(sales_file()).unwrap();
        assert_eq!(file.record_count(), 4);
        assert_eq!(file.readable_records(), 4);
        assert!(!file.is_truncated());
        assert_eq!(file.schema().len(), 5);
        assert!(file.field("S_AMT").is_some());
    }

    #[test]
    fn test_record_access() {
        let file = DbfFile::from_bytes(sales_file()).unwrap();
        let record = file.record(0).unwrap();
        assert_eq!(record.get("NBHC").map(|v| v.text()), Some("100200"));
        assert_eq!(file.is_deleted(2), Some(true));
        assert_eq!(file.is_deleted(1), Some(false));
        assert_eq!(file.is_deleted(4), None);
        assert!(file.record(4).is_none());
    }

    #[test]
    fn test_records_skips_deleted() {
        let file = DbfFile::from_bytes(sales_file()).unwrap();
        let indices: Vec<u32> = file.records().map(|r| r.index()).collect();
        assert_eq!(indices, vec![0, 1, 3]);
    }

    #[test]
    fn test_truncated_buffer() {
        let mut bytes = sales_file();
        bytes.truncate(bytes.len() - 5);
        let file = DbfFile::from_bytes(bytes).unwrap();

        assert!(file.is_truncated());
        assert_eq!(file.readable_records(), 3);
        assert!(file.record(3).is_none());
        assert!(matches!(
            file.record_strict(3),
            Err(ReaderError::TruncatedRecord { index: 3, .. })
        ));
        assert!(file.record_strict(0).is_ok());
    }

    #[test]
    fn test_rejects_short_buffer() {
        let result = DbfFile::from_bytes(vec![0x03u8; 10]);
        assert!(matches!(result, Err(ReaderError::MalformedHeader { .. })));
    }

    #[test]
    fn test_rejects_inconsistent_record_length() {
        let bytes = DbfFixture::new()
            .character("GRANTOR", 30)
            .record_length(10)
            .build();
        let result = DbfFile::from_bytes(bytes);
        assert!(matches!(result, Err(ReaderError::SchemaMismatch(_))));
    }

    #[tokio::test]
    async fn test_open_from_source() {
        let source = MemorySource::new(sales_file());
        let file = DbfFile::open(&source).await.unwrap();
        assert_eq!(file.record_count(), 4);
    }

    #[tokio::test]
    async fn test_open_path_missing() {
        let result = DbfFile::open_path("/no/such/allsales.dbf").await;
        assert!(matches!(
            result,
            Err(ReaderError::Source(SourceError::NotFound(_)))
        ));
    }
}
