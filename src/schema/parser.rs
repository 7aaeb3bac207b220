//! Field descriptor table parsing.
//!
//! The table starts right after the 32-byte header. Each descriptor is 32
//! bytes:
//!
//! ```text
//! [0-10]  name, NUL-padded
//! [11]    type byte ('C', 'N', 'D', 'L', ...)
//! [12-15] reserved
//! [16]    length
//! [17]    decimal count
//! [18-31] reserved
//! ```
//!
//! The table ends at a `0x0D` byte or at the declared header length.

use crate::error::ReaderError;
use crate::reader::{trim_field, DbfHeader, HEADER_SIZE};

use super::{FieldDescriptor, FieldType, Schema};

/// Size of one field descriptor in bytes.
pub const FIELD_DESCRIPTOR_SIZE: usize = 32;

/// Byte that terminates the field descriptor table.
pub const FIELD_TABLE_TERMINATOR: u8 = 0x0D;

/// Maximum number of name bytes in a descriptor.
pub const MAX_FIELD_NAME_LEN: usize = 11;

/// Parse the field descriptor table into a [`Schema`].
///
/// # Arguments
/// * `bytes` - The file bytes, at least up to `header.header_length`
/// * `header` - The already-parsed fixed header
///
/// # Errors
/// - `ReaderError::MalformedHeader` if a descriptor runs past the end of `bytes`
/// - `ReaderError::SchemaMismatch` if the table is empty, if the fields are
///   wider than the declared record length, or if the declared header length
///   cannot hold the table and its terminator
pub fn parse_fields(bytes: &[u8], header: &DbfHeader) -> Result<Schema, ReaderError> {
    let header_length = header.header_length as usize;
    let mut fields = Vec::new();
    let mut offset = HEADER_SIZE;

    while offset < header_length {
        let Some(&first) = bytes.get(offset) else {
            return Err(ReaderError::malformed(
                offset as u64,
                format!(
                    "Field table truncated: header declares {} bytes, buffer has {}",
                    header_length,
                    bytes.len()
                ),
            ));
        };

        if first == FIELD_TABLE_TERMINATOR {
            break;
        }

        let descriptor = bytes
            .get(offset..offset + FIELD_DESCRIPTOR_SIZE)
            .ok_or_else(|| {
                ReaderError::malformed(
                    offset as u64,
                    format!(
                        "Field descriptor {} needs {} bytes, buffer has {}",
                        fields.len(),
                        FIELD_DESCRIPTOR_SIZE,
                        bytes.len() - offset
                    ),
                )
            })?;

        fields.push(parse_descriptor(descriptor));
        offset += FIELD_DESCRIPTOR_SIZE;
    }

    if fields.is_empty() {
        return Err(ReaderError::SchemaMismatch(
            "Field descriptor table is empty".to_string(),
        ));
    }

    let required_header = HEADER_SIZE + FIELD_DESCRIPTOR_SIZE * fields.len() + 1;
    if header_length < required_header {
        return Err(ReaderError::SchemaMismatch(format!(
            "Header length {} cannot hold {} field descriptors and terminator ({} bytes needed)",
            header_length,
            fields.len(),
            required_header
        )));
    }

    let schema = Schema::new(fields);
    let width = schema.min_record_length();
    if width > header.record_length as u32 {
        return Err(ReaderError::SchemaMismatch(format!(
            "Fields need {} bytes per record (including deletion flag) but record length is {}",
            width, header.record_length
        )));
    }

    Ok(schema)
}

fn parse_descriptor(descriptor: &[u8]) -> FieldDescriptor {
    let raw_name = &descriptor[..MAX_FIELD_NAME_LEN];
    let name_end = raw_name.iter().position(|&b| b == 0).unwrap_or(raw_name.len());
    let name: String = trim_field(&raw_name[..name_end])
        .iter()
        .map(|&b| b as char)
        .collect();

    FieldDescriptor::new(
        name,
        FieldType::from_byte(descriptor[11]),
        descriptor[16],
        descriptor[17],
    )
}
