//! DBF file reader components
//!
//! This module provides the core reading functionality for DBF files:
//! header parsing, fixed-width record decoding, an in-memory file handle,
//! and a ranged reader for sources that should not be loaded whole.

mod codec;
mod file;
mod header;
mod records;

pub use codec::{
    decode_field, decode_record, decode_record_at, decode_text, field_slice, is_deleted,
    parse_dbf_date, parse_numeric, trim_field, FieldValue, Record,
};
pub use file::DbfFile;
pub use header::{DbfHeader, DELETED_FLAG, HEADER_SIZE};
pub use records::RecordReader;
