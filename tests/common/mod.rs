//! Shared helpers for building synthetic DBF files in integration tests.

#![allow(dead_code)]

/// One column of a synthetic file.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub field_type: u8,
    pub length: u8,
    pub decimals: u8,
}

impl Column {
    pub fn character(name: &str, length: u8) -> Self {
        Self {
            name: name.to_string(),
            field_type: b'C',
            length,
            decimals: 0,
        }
    }

    pub fn numeric(name: &str, length: u8, decimals: u8) -> Self {
        Self {
            name: name.to_string(),
            field_type: b'N',
            length,
            decimals,
        }
    }
}

/// Builds a dBASE III file in memory.
#[derive(Debug, Clone, Default)]
pub struct DbfBuilder {
    columns: Vec<Column>,
    rows: Vec<(bool, Vec<String>)>,
    record_padding: u16,
}

impl DbfBuilder {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    /// Extra bytes at the end of every record.
    pub fn record_padding(mut self, padding: u16) -> Self {
        self.record_padding = padding;
        self
    }

    pub fn row(mut self, values: &[&str]) -> Self {
        self.rows
            .push((false, values.iter().map(|v| v.to_string()).collect()));
        self
    }

    pub fn deleted_row(mut self, values: &[&str]) -> Self {
        self.rows
            .push((true, values.iter().map(|v| v.to_string()).collect()));
        self
    }

    pub fn header_length(&self) -> usize {
        32 + 32 * self.columns.len() + 1
    }

    pub fn record_length(&self) -> usize {
        1 + self.columns.iter().map(|c| c.length as usize).sum::<usize>()
            + self.record_padding as usize
    }

    pub fn build(&self) -> Vec<u8> {
        let header_length = self.header_length();
        let record_length = self.record_length();

        let mut bytes = vec![0u8; 32];
        bytes[0] = 0x03;
        bytes[1] = 125;
        bytes[2] = 6;
        bytes[3] = 30;
        bytes[4..8].copy_from_slice(&(self.rows.len() as u32).to_le_bytes());
        bytes[8..10].copy_from_slice(&(header_length as u16).to_le_bytes());
        bytes[10..12].copy_from_slice(&(record_length as u16).to_le_bytes());

        for column in &self.columns {
            let mut descriptor = [0u8; 32];
            let name = column.name.as_bytes();
            descriptor[..name.len().min(11)].copy_from_slice(&name[..name.len().min(11)]);
            descriptor[11] = column.field_type;
            descriptor[16] = column.length;
            descriptor[17] = column.decimals;
            bytes.extend_from_slice(&descriptor);
        }
        bytes.push(0x0D);

        for (deleted, values) in &self.rows {
            bytes.push(if *deleted { b'*' } else { b' ' });
            for (column, value) in self.columns.iter().zip(values) {
                let width = column.length as usize;
                let text: Vec<u8> = value.bytes().take(width).collect();
                let fill = vec![b' '; width - text.len()];
                if column.field_type == b'N' {
                    bytes.extend_from_slice(&fill);
                    bytes.extend_from_slice(&text);
                } else {
                    bytes.extend_from_slice(&text);
                    bytes.extend_from_slice(&fill);
                }
            }
            bytes.extend(std::iter::repeat(b' ').take(self.record_padding as usize));
        }

        bytes.push(0x1A);
        bytes
    }
}

/// The sales layout used across integration tests.
pub fn sales_columns() -> Vec<Column> {
    vec![
        Column::character("PIN", 10),
        Column::character("NBHC", 6),
        Column::character("S_DATE", 8),
        Column::character("QU", 1),
        Column::character("REA_CD", 2),
        Column::numeric("S_AMT", 12, 2),
        Column::character("GRANTOR", 16),
        Column::character("GRANTEE", 16),
    ]
}

/// Eight sales, index 5 deleted.
pub fn sales_builder() -> DbfBuilder {
    DbfBuilder::new(sales_columns())
        .row(&["A-0001", "100200", "20190312", "Q", "01", "210000.00", "OLD OWNER", "SMITH JOHN"])
        .row(&["A-0002", "100200", "20200701", "U", "11", "100.00", "SMITH JOHN", "SMITH MARY"])
        .row(&["B-0100", "300400", "20211115", "Q", "01", "455000.00", "BANK NA", "O'NEIL \"RED\""])
        .row(&["A-0003", "100200", "20220228", "Q", "01", "305500.00", "ACME LLC", "DOE JANE"])
        .row(&["A-0004", "100200", "20230105", "U", "05", "", "ESTATE OF X", "DOE JOHN"])
        .deleted_row(&["A-0005", "100200", "20230610", "Q", "01", "999999.00", "GONE", "GONE"])
        .row(&["B-0101", "300400", "20231201", "Q", "01", "1250000.00", "HOLDINGS INC", "SMITHFIELD TR"])
        .row(&["A-0006", "100200", "20240415", "Q", "01", "389900.00", "DOE JANE", "NGUYEN AN"])
}
