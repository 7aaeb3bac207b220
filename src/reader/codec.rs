//! Record decoding
//!
//! Converts the fixed-width bytes of a record into typed values. Every
//! field is decoded the same way: slice exactly `length` bytes at the field's
//! offset, trim ASCII whitespace and NUL, and read the rest as Latin-1 text.
//! Numeric columns are then parsed as `f64`.
//!
//! Decoding never fails on content. Blank or garbage numeric fields (common
//! in legacy county data) become `None` instead of aborting a scan over
//! millions of records.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::schema::{FieldDescriptor, Schema};

use super::header::{DbfHeader, DELETED_FLAG};

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Trimmed text of a non-numeric field.
    Text(String),
    /// Numeric field: the trimmed text and its parsed value, `None` when the
    /// field is blank or not a number.
    Numeric { text: String, value: Option<f64> },
}

impl FieldValue {
    /// The trimmed text of the field, for any type.
    pub fn text(&self) -> &str {
        match self {
            FieldValue::Text(text) => text,
            FieldValue::Numeric { text, .. } => text,
        }
    }

    /// Text of a non-numeric field.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Numeric { .. } => None,
        }
    }

    /// Parsed value of a numeric field.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Numeric { value, .. } => *value,
            FieldValue::Text(_) => None,
        }
    }

    /// Interpret the text as a `YYYYMMDD` date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        parse_dbf_date(self.text())
    }

    /// Interpret the text as a logical flag (`T`/`Y` true, `F`/`N` false).
    pub fn as_logical(&self) -> Option<bool> {
        match self.text() {
            "T" | "t" | "Y" | "y" => Some(true),
            "F" | "f" | "N" | "n" => Some(false),
            _ => None,
        }
    }

    /// Whether the field held only padding.
    pub fn is_blank(&self) -> bool {
        self.text().is_empty()
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(text) => serializer.serialize_str(text),
            FieldValue::Numeric { value: Some(v), .. } => serializer.serialize_f64(*v),
            FieldValue::Numeric { value: None, .. } => serializer.serialize_none(),
        }
    }
}

/// One decoded record: a value per schema field, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    index: u32,
    schema: Arc<Schema>,
    values: Vec<FieldValue>,
}

impl Record {
    /// Position of the record in the file.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The schema the record was decoded with.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Value of the named field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.schema.index_of(name).map(|i| &self.values[i])
    }

    /// Values in schema order.
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Field names in schema order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.schema.field_names()
    }

    /// `(descriptor, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldDescriptor, &FieldValue)> {
        self.schema.fields().iter().zip(self.values.iter())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(&field.name, value)?;
        }
        map.end()
    }
}

/// Trim ASCII whitespace and NUL padding from both ends of a field.
pub fn trim_field(bytes: &[u8]) -> &[u8] {
    let is_pad = |b: &u8| b.is_ascii_whitespace() || *b == 0;
    let start = bytes.iter().position(|b| !is_pad(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_pad(b)).map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Decode a field's bytes as trimmed Latin-1 text.
pub fn decode_text(bytes: &[u8]) -> String {
    trim_field(bytes).iter().map(|&b| b as char).collect()
}

/// Parse trimmed numeric text. Returns `None` for blank input, non-ASCII
/// bytes, overflow markers such as `***`, and anything else that is not a
/// finite decimal number.
pub fn parse_numeric(text: &str) -> Option<f64> {
    if text.is_empty()
        || !text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a `YYYYMMDD` date string.
pub fn parse_dbf_date(text: &str) -> Option<NaiveDate> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y%m%d").ok()
}

/// Whether the record starting at `record_offset` carries the deletion flag.
#[inline]
pub fn is_deleted(bytes: &[u8], record_offset: u64) -> bool {
    usize::try_from(record_offset)
        .ok()
        .and_then(|offset| bytes.get(offset))
        .is_some_and(|&flag| flag == DELETED_FLAG)
}

/// The raw bytes of one field of the record at `record_offset`, or `None`
/// when they lie outside `bytes`.
#[inline]
pub fn field_slice<'a>(
    bytes: &'a [u8],
    record_offset: u64,
    field: &FieldDescriptor,
) -> Option<&'a [u8]> {
    let start = usize::try_from(record_offset + field.byte_offset as u64).ok()?;
    bytes.get(start..start.checked_add(field.length as usize)?)
}

/// Decode one field of the record at `record_offset`.
///
/// Fields outside the buffer decode as blank values.
pub fn decode_field(bytes: &[u8], record_offset: u64, field: &FieldDescriptor) -> FieldValue {
    let text = field_slice(bytes, record_offset, field)
        .map(decode_text)
        .unwrap_or_default();

    if field.field_type.is_numeric() {
        let value = parse_numeric(&text);
        FieldValue::Numeric { text, value }
    } else {
        FieldValue::Text(text)
    }
}

/// Decode the record at `record_offset` with an explicit record length.
///
/// Returns `None` when the record does not fit in `bytes`.
pub fn decode_record_at(
    bytes: &[u8],
    record_offset: u64,
    record_length: u16,
    index: u32,
    schema: &Arc<Schema>,
) -> Option<Record> {
    let end = record_offset.checked_add(record_length as u64)?;
    if end > bytes.len() as u64 {
        return None;
    }

    let values = schema
        .fields()
        .iter()
        .map(|field| decode_field(bytes, record_offset, field))
        .collect();

    Some(Record {
        index,
        schema: Arc::clone(schema),
        values,
    })
}

/// Decode record `index` of a DBF buffer.
///
/// Returns `None` when the record's byte range runs past the end of the
/// buffer, which callers treat as the end of readable data.
pub fn decode_record(
    bytes: &[u8],
    index: u32,
    schema: &Arc<Schema>,
    header: &DbfHeader,
) -> Option<Record> {
    decode_record_at(
        bytes,
        header.record_offset(index),
        header.record_length,
        index,
        schema,
    )
}
