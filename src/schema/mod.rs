//! DBF schema types and field-table parsing.
//!
//! A DBF file describes its own columns in a table of 32-byte field
//! descriptors that follows the fixed header. This module turns that table
//! into an immutable [`Schema`] with precomputed byte offsets.

mod parser;
mod types;

pub use parser::{parse_fields, FIELD_DESCRIPTOR_SIZE, FIELD_TABLE_TERMINATOR, MAX_FIELD_NAME_LEN};
pub use types::*;
