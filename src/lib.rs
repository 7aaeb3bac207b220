//! Streaming reader, filter engine and CSV exporter for dBASE (DBF) files
//!
//! This library parses the self-describing DBF header and field table,
//! scans millions of fixed-width records with predicates evaluated on raw
//! bytes, decodes matching records lazily in batches, and exports results
//! as CSV. The same engine runs over a local file or a buffered HTTP
//! download.
//!
//! # Example
//! ```no_run
//! use dbfscan::api::{scan, ScanOptions, SalesFilter};
//! use dbfscan::DbfFile;
//!
//! # async fn example() -> Result<(), dbfscan::ReaderError> {
//! let file = DbfFile::open_path("DBF/allsales.dbf").await?;
//! let predicate = SalesFilter::new()
//!     .with_nbhc("100200")
//!     .qualified_only(true)
//!     .to_predicate()?;
//! let result = scan(&file, &predicate, &ScanOptions::new().with_limit(50));
//! for index in result.indices() {
//!     if let Some(record) = file.record(*index) {
//!         println!("{:?}", record.get("S_AMT"));
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod error;
pub mod reader;
pub mod schema;
pub mod source;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use error::{ErrorKind, ReaderError, SourceError};
pub use reader::{
    decode_field, decode_record, is_deleted, DbfFile, DbfHeader, FieldValue, Record, RecordReader,
};
pub use schema::{parse_fields, FieldDescriptor, FieldType, Schema};
pub use source::{
    open_source, BoxedSource, HttpConfig, HttpSource, LocalSource, MemorySource, StreamSource,
};
