//! CSV export of scan results.
//!
//! Every value is wrapped in double quotes with embedded quotes doubled, the
//! first row holds the field names, and every row ends with `\n`. `S_AMT`
//! is written in the same grouped form the grid shows.

use std::io::Write;

use tracing::info;

use crate::error::ReaderError;
use crate::reader::DbfFile;

use super::batch::display_value;

/// Rows between progress callbacks.
pub const PROGRESS_INTERVAL: usize = 10_000;

/// Export the records at `indices` as CSV text.
///
/// Deleted and unreadable indices are skipped.
pub fn export_csv(file: &DbfFile, indices: &[u32]) -> String {
    let mut out = header_line(file);
    for &index in indices {
        if let Some(line) = record_line(file, index) {
            out.extend_from_slice(&line);
        }
    }
    out.into_iter().map(char::from).collect()
}

/// Stream the records at `indices` to `writer` as CSV.
///
/// Text is written as Latin-1 bytes, matching the file's encoding.
/// `on_progress(done, total)` is called every [`PROGRESS_INTERVAL`] indices
/// and once at the end.
///
/// # Returns
/// The number of data rows written.
///
/// # Errors
/// `ReaderError::Io` if the writer fails.
pub fn write_csv<W, F>(
    file: &DbfFile,
    indices: &[u32],
    mut writer: W,
    mut on_progress: F,
) -> Result<usize, ReaderError>
where
    W: Write,
    F: FnMut(usize, usize),
{
    let total = indices.len();
    writer.write_all(&header_line(file))?;

    let mut rows = 0;
    for (done, &index) in indices.iter().enumerate() {
        if done > 0 && done % PROGRESS_INTERVAL == 0 {
            on_progress(done, total);
        }
        if let Some(line) = record_line(file, index) {
            writer.write_all(&line)?;
            rows += 1;
        }
    }

    writer.flush()?;
    on_progress(total, total);
    info!(rows, requested = total, "CSV export complete");

    Ok(rows)
}

fn header_line(file: &DbfFile) -> Vec<u8> {
    encode_row(file.schema().field_names())
}

/// `None` for deleted or unreadable records.
fn record_line(file: &DbfFile, index: u32) -> Option<Vec<u8>> {
    if file.is_deleted(index) != Some(false) {
        return None;
    }
    let record = file.record(index)?;
    let values: Vec<String> = record
        .iter()
        .map(|(field, value)| display_value(field, value))
        .collect();
    Some(encode_row(values.iter().map(String::as_str)))
}

fn encode_row<'a>(values: impl Iterator<Item = &'a str>) -> Vec<u8> {
    let mut line = Vec::new();
    for (i, value) in values.enumerate() {
        if i > 0 {
            line.push(b',');
        }
        quote_into(&mut line, value);
    }
    line.push(b'\n');
    line
}

fn quote_into(out: &mut Vec<u8>, value: &str) {
    out.push(b'"');
    for c in value.chars() {
        if c == '"' {
            out.extend_from_slice(b"\"\"");
        } else {
            // Decoded text only holds Latin-1 characters.
            out.push(u8::try_from(u32::from(c)).unwrap_or(b'?'));
        }
    }
    out.push(b'"');
}
