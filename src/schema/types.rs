//! DBF field and schema types.

use serde::{Serialize, Serializer};

/// The type of a DBF column, taken from the descriptor's type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// `C` - fixed-width text.
    Character,
    /// `N` - ASCII number with optional sign and decimal point.
    Numeric,
    /// `F` - ASCII floating-point number.
    Float,
    /// `D` - `YYYYMMDD` text.
    Date,
    /// `L` - single-byte logical flag.
    Logical,
    /// `M` - pointer into a `.DBT` memo file (not followed).
    Memo,
    /// Any other type byte, kept verbatim.
    Other(u8),
}

impl FieldType {
    /// Map a descriptor type byte to a field type.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'C' => FieldType::Character,
            b'N' => FieldType::Numeric,
            b'F' => FieldType::Float,
            b'D' => FieldType::Date,
            b'L' => FieldType::Logical,
            b'M' => FieldType::Memo,
            other => FieldType::Other(other),
        }
    }

    /// The descriptor type byte for this field type.
    pub fn to_byte(self) -> u8 {
        match self {
            FieldType::Character => b'C',
            FieldType::Numeric => b'N',
            FieldType::Float => b'F',
            FieldType::Date => b'D',
            FieldType::Logical => b'L',
            FieldType::Memo => b'M',
            FieldType::Other(byte) => byte,
        }
    }

    /// Whether values of this type decode to numbers.
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Numeric | FieldType::Float)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_byte() as char)
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.to_byte() as char)
    }
}

/// Metadata for one column of a DBF file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Column name (at most 11 bytes in the file, trimmed).
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Width in bytes.
    pub length: u8,
    /// Digits after the decimal point for numeric columns.
    pub decimal_count: u8,
    /// Offset of the column from the start of a record. The first column
    /// sits at 1, after the deletion flag.
    pub byte_offset: u32,
}

impl FieldDescriptor {
    /// Create a descriptor. The byte offset is assigned when the descriptor
    /// is placed in a [`Schema`].
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
        length: u8,
        decimal_count: u8,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            length,
            decimal_count,
            byte_offset: 0,
        }
    }

    /// Offset one past the last byte of this column within a record.
    pub fn end_offset(&self) -> u32 {
        self.byte_offset + self.length as u32
    }
}

/// Ordered, immutable set of field descriptors for one DBF file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    /// Build a schema, assigning each field's byte offset by accumulating
    /// widths from 1 (byte 0 of every record is the deletion flag).
    pub fn new(mut fields: Vec<FieldDescriptor>) -> Self {
        let mut offset = 1u32;
        for field in &mut fields {
            field.byte_offset = offset;
            offset += field.length as u32;
        }
        Self { fields }
    }

    /// All fields in file order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by exact name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Position of a field by exact name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Field names in file order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Smallest record length that can hold every field plus the deletion flag.
    pub fn min_record_length(&self) -> u32 {
        self.fields.last().map_or(1, |f| f.end_offset())
    }
}
