//! Synthetic DBF buffers for unit tests.

use crate::reader::DELETED_FLAG;
use crate::schema::FIELD_TABLE_TERMINATOR;

const EOF_MARKER: u8 = 0x1A;

struct FixtureField {
    name: String,
    field_type: u8,
    length: u8,
    decimals: u8,
}

/// Builds DBF bytes field by field and record by record.
pub(crate) struct DbfFixture {
    fields: Vec<FixtureField>,
    records: Vec<(bool, Vec<String>)>,
    record_length: Option<u16>,
    header_length: Option<u16>,
    record_count: Option<u32>,
}

impl DbfFixture {
    pub(crate) fn new() -> Self {
        Self {
            fields: Vec::new(),
            records: Vec::new(),
            record_length: None,
            header_length: None,
            record_count: None,
        }
    }

    pub(crate) fn field(mut self, name: &str, field_type: u8, length: u8, decimals: u8) -> Self {
        self.fields.push(FixtureField {
            name: name.to_string(),
            field_type,
            length,
            decimals,
        });
        self
    }

    pub(crate) fn character(self, name: &str, length: u8) -> Self {
        self.field(name, b'C', length, 0)
    }

    pub(crate) fn numeric(self, name: &str, length: u8, decimals: u8) -> Self {
        self.field(name, b'N', length, decimals)
    }

    pub(crate) fn record(mut self, values: &[&str]) -> Self {
        self.records
            .push((false, values.iter().map(|v| v.to_string()).collect()));
        self
    }

    pub(crate) fn deleted_record(mut self, values: &[&str]) -> Self {
        self.records
            .push((true, values.iter().map(|v| v.to_string()).collect()));
        self
    }

    pub(crate) fn record_length(mut self, length: u16) -> Self {
        self.record_length = Some(length);
        self
    }

    pub(crate) fn header_length(mut self, length: u16) -> Self {
        self.header_length = Some(length);
        self
    }

    pub(crate) fn record_count(mut self, count: u32) -> Self {
        self.record_count = Some(count);
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let width: usize = 1 + self.fields.iter().map(|f| f.length as usize).sum::<usize>();
        let record_length = self.record_length.map_or(width, |l| l as usize);
        let header_length = self
            .header_length
            .map_or(32 + 32 * self.fields.len() + 1, |l| l as usize);
        let record_count = self.record_count.unwrap_or(self.records.len() as u32);

        let mut bytes = vec![0u8; 32];
        bytes[0] = 0x03;
        bytes[1] = 124;
        bytes[2] = 1;
        bytes[3] = 31;
        bytes[4..8].copy_from_slice(&record_count.to_le_bytes());
        bytes[8..10].copy_from_slice(&(header_length as u16).to_le_bytes());
        bytes[10..12].copy_from_slice(&(record_length as u16).to_le_bytes());

        for field in &self.fields {
            let mut descriptor = [0u8; 32];
            let name = field.name.as_bytes();
            let n = name.len().min(11);
            descriptor[..n].copy_from_slice(&name[..n]);
            descriptor[11] = field.field_type;
            descriptor[16] = field.length;
            descriptor[17] = field.decimals;
            bytes.extend_from_slice(&descriptor);
        }
        bytes.push(FIELD_TABLE_TERMINATOR);
        bytes.resize(header_length.max(bytes.len()), 0);

        for (deleted, values) in &self.records {
            let mut record = Vec::with_capacity(record_length);
            record.push(if *deleted { DELETED_FLAG } else { b' ' });
            for (field, value) in self.fields.iter().zip(values) {
                record.extend_from_slice(&pad(field, value));
            }
            record.resize(record_length, b' ');
            bytes.extend_from_slice(&record);
        }

        bytes.push(EOF_MARKER);
        bytes
    }
}

/// Fixed-width Latin-1 encoding: numbers right-aligned, everything else
/// left-aligned.
fn pad(field: &FixtureField, value: &str) -> Vec<u8> {
    let len = field.length as usize;
    let mut raw: Vec<u8> = value
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .take(len)
        .collect();
    let fill = len - raw.len();
    if field.field_type == b'N' {
        let mut out = vec![b' '; fill];
        out.append(&mut raw);
        out
    } else {
        raw.resize(len, b' ');
        raw
    }
}

/// A small county sales file:
///
/// | idx | NBHC   | S_DATE   | QU | S_AMT     | GRANTEE          |
/// |-----|--------|----------|----|-----------|------------------|
/// | 0   | 100200 | 20220110 | Q  | 185000.00 | SMITH JOHN       |
/// | 1   | 100200 | 20230615 | U  | 100.00    | DOE JANE         |
/// | 2*  | 100200 | 20230701 | Q  | 250000.00 | DELETED BUYER    |
/// | 3   | 300400 | 20240302 | Q  | 320500.00 | ACME "HOLDINGS"  |
///
/// `*` marks a deleted record.
pub(crate) fn sales_file() -> Vec<u8> {
    DbfFixture::new()
        .character("NBHC", 6)
        .character("S_DATE", 8)
        .character("QU", 1)
        .numeric("S_AMT", 12, 2)
        .character("GRANTEE", 20)
        .record(&["100200", "20220110", "Q", "185000.00", "SMITH JOHN"])
        .record(&["100200", "20230615", "U", "100.00", "DOE JANE"])
        .deleted_record(&["100200", "20230701", "Q", "250000.00", "DELETED BUYER"])
        .record(&["300400", "20240302", "Q", "320500.00", "ACME \"HOLDINGS\""])
        .build()
}
