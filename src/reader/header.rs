//! DBF file header parsing
//!
//! Parses the fixed 32-byte header at the start of every DBF file:
//!
//! ```text
//! Offset 0      : version
//! Offset 1-3    : last update date (YY since 1900, MM, DD)
//! Offset 4-7    : record count, u32 LE
//! Offset 8-9    : header length in bytes, u16 LE
//! Offset 10-11  : record length in bytes, u16 LE
//! Offset 12-31  : reserved
//! ```

use chrono::NaiveDate;

use crate::error::ReaderError;

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 32;

/// Deletion flag value (`'*'`) in byte 0 of a record.
pub const DELETED_FLAG: u8 = 0x2A;

/// Parsed DBF file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbfHeader {
    /// Format version byte (0x03 for dBASE III without memo)
    pub version: u8,
    /// Date of last update, when the stored bytes form a valid date
    pub last_update: Option<NaiveDate>,
    /// Number of records the header claims
    pub record_count: u32,
    /// Bytes before the first record (header + field table + terminator)
    pub header_length: u16,
    /// Bytes per record, including the deletion flag
    pub record_length: u16,
}

impl DbfHeader {
    /// Parse the fixed header from the start of a DBF file.
    ///
    /// # Errors
    /// `ReaderError::MalformedHeader` if fewer than 32 bytes are available, the
    /// header length is shorter than the fixed header itself, or the record
    /// length is zero.
    pub fn parse(bytes: &[u8]) -> Result<Self, ReaderError> {
        if bytes.len() < HEADER_SIZE {
            return Err(ReaderError::malformed(
                0,
                format!(
                    "Header too short: expected at least {} bytes, got {}",
                    HEADER_SIZE,
                    bytes.len()
                ),
            ));
        }

        let version = bytes[0];
        let last_update = NaiveDate::from_ymd_opt(
            1900 + bytes[1] as i32,
            bytes[2] as u32,
            bytes[3] as u32,
        );
        let record_count = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let header_length = u16::from_le_bytes([bytes[8], bytes[9]]);
        let record_length = u16::from_le_bytes([bytes[10], bytes[11]]);

        if (header_length as usize) < HEADER_SIZE {
            return Err(ReaderError::malformed(
                8,
                format!(
                    "Header length {} is shorter than the {}-byte fixed header",
                    header_length, HEADER_SIZE
                ),
            ));
        }

        if record_length == 0 {
            return Err(ReaderError::malformed(10, "Record length is zero"));
        }

        Ok(Self {
            version,
            last_update,
            record_count,
            header_length,
            record_length,
        })
    }

    /// Byte offset of record `index`.
    #[inline]
    pub fn record_offset(&self, index: u32) -> u64 {
        self.header_length as u64 + index as u64 * self.record_length as u64
    }

    /// File size implied by the header.
    pub fn declared_size(&self) -> u64 {
        self.record_offset(self.record_count)
    }

    /// Number of records fully contained in a buffer of `buffer_len` bytes,
    /// never more than the declared count.
    pub fn readable_records(&self, buffer_len: u64) -> u32 {
        let data_start = self.header_length as u64;
        if buffer_len <= data_start {
            return 0;
        }
        let complete = (buffer_len - data_start) / self.record_length as u64;
        complete.min(self.record_count as u64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_header(record_count: u32, header_length: u16, record_length: u16) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_SIZE];
        bytes[0] = 0x03;
        bytes[1] = 124;
        bytes[2] = 3;
        bytes[3] = 15;
        bytes[4..8].copy_from_slice(&record_count.to_le_bytes());
        bytes[8..10].copy_from_slice(&header_length.to_le_bytes());
        bytes[10..12].copy_from_slice(&record_length.to_le_bytes());
        bytes
    }

    #[test]
    fn test_parse_header() {
        let header = DbfHeader::parse(&raw_header(2_400_000, 545, 256)).unwrap();
        assert_eq!(header.version, 0x03);
        assert_eq!(header.record_count, 2_400_000);
        assert_eq!(header.header_length, 545);
        assert_eq!(header.record_length, 256);
        assert_eq!(header.last_update, NaiveDate::from_ymd_opt(2024, 3, 15));
    }

    #[test]
    fn test_parse_header_little_endian() {
        let mut bytes = raw_header(0, 32, 1);
        bytes[4..8].copy_from_slice(&[0x01, 0x02, 0x03, 0x04]);
        bytes[8..10].copy_from_slice(&[0x61, 0x00]);
        bytes[10..12].copy_from_slice(&[0x15, 0x01]);
        let header = DbfHeader::parse(&bytes).unwrap();
        assert_eq!(header.record_count, 0x0403_0201);
        assert_eq!(header.header_length, 97);
        assert_eq!(header.record_length, 0x0115);
    }

    #[test]
    fn test_parse_header_too_short() {
        let result = DbfHeader::parse(&[0x03; 31]);
        assert!(matches!(result, Err(ReaderError::MalformedHeader { .. })));
    }

    #[test]
    fn test_parse_header_invalid_date_is_none() {
        let mut bytes = raw_header(1, 65, 2);
        bytes[2] = 13;
        let header = DbfHeader::parse(&bytes).unwrap();
        assert!(header.last_update.is_none());
    }

    #[test]
    fn test_parse_header_rejects_short_header_length() {
        let result = DbfHeader::parse(&raw_header(1, 16, 2));
        assert!(matches!(
            result,
            Err(ReaderError::MalformedHeader { offset: 8, .. })
        ));
    }

    #[test]
    fn test_parse_header_rejects_zero_record_length() {
        let result = DbfHeader::parse(&raw_header(1, 65, 0));
        assert!(matches!(
            result,
            Err(ReaderError::MalformedHeader { offset: 10, .. })
        ));
    }

    #[test]
    fn test_record_offsets() {
        let header = DbfHeader::parse(&raw_header(3, 97, 21)).unwrap();
        assert_eq!(header.record_offset(0), 97);
        assert_eq!(header.record_offset(2), 139);
        assert_eq!(header.declared_size(), 160);
    }

    #[test]
    fn test_record_offset_does_not_overflow() {
        let header = DbfHeader::parse(&raw_header(u32::MAX, u16::MAX, u16::MAX)).unwrap();
        let expected = u16::MAX as u64 + (u32::MAX as u64 - 1) * u16::MAX as u64;
        assert_eq!(header.record_offset(u32::MAX - 1), expected);
    }

    #[test]
    fn test_readable_records() {
        let header = DbfHeader::parse(&raw_header(3, 97, 21)).unwrap();
        assert_eq!(header.readable_records(50), 0);
        assert_eq!(header.readable_records(97), 0);
        assert_eq!(header.readable_records(117), 0);
        assert_eq!(header.readable_records(118), 1);
        assert_eq!(header.readable_records(150), 2);
        assert_eq!(header.readable_records(160), 3);
        // Trailing EOF marker or extra bytes never add records.
        assert_eq!(header.readable_records(10_000), 3);
    }
}
