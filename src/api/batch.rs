//! Lazy batch materialization for paged display.
//!
//! A scan result holds only indices. `materialize_batch` decodes one slice of
//! them, and `BatchCursor` remembers how far a reader has paged so each
//! `next_batch` call decodes only records that have not been shown yet.

use crate::reader::{DbfFile, FieldValue, Record};
use crate::schema::FieldDescriptor;

use super::fields::S_AMT;

/// Default number of records per display batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Decode the records at `indices[start..start + count]`, in list order.
///
/// The range is clamped to the list. Indices that are no longer readable are
/// skipped.
pub fn materialize_batch(file: &DbfFile, indices: &[u32], start: usize, count: usize) -> Vec<Record> {
    let start = start.min(indices.len());
    let end = start.saturating_add(count).min(indices.len());
    indices[start..end]
        .iter()
        .filter_map(|&index| file.record(index))
        .collect()
}

/// Pages through an index list in fixed-size batches.
#[derive(Debug, Clone)]
pub struct BatchCursor {
    indices: Vec<u32>,
    position: usize,
    batch_size: usize,
}

impl BatchCursor {
    /// Create a cursor with the default batch size.
    pub fn new(indices: Vec<u32>) -> Self {
        Self::with_batch_size(indices, DEFAULT_BATCH_SIZE)
    }

    /// Create a cursor with a custom batch size (at least 1).
    pub fn with_batch_size(indices: Vec<u32>, batch_size: usize) -> Self {
        Self {
            indices,
            position: 0,
            batch_size: batch_size.max(1),
        }
    }

    /// Decode the next batch and advance. Returns an empty vector once every
    /// index has been shown.
    pub fn next_batch(&mut self, file: &DbfFile) -> Vec<Record> {
        let batch = materialize_batch(file, &self.indices, self.position, self.batch_size);
        self.position = (self.position + self.batch_size).min(self.indices.len());
        batch
    }

    /// Decode page `page` (zero-based) without moving the cursor.
    pub fn page(&self, file: &DbfFile, page: usize) -> Vec<Record> {
        materialize_batch(
            file,
            &self.indices,
            page.saturating_mul(self.batch_size),
            self.batch_size,
        )
    }

    /// Number of indices already handed out.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether indices remain to be shown.
    pub fn has_more(&self) -> bool {
        self.position < self.indices.len()
    }

    /// Total number of indices.
    pub fn total(&self) -> usize {
        self.indices.len()
    }

    /// Records per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Go back to the first batch.
    pub fn reset(&mut self) {
        self.position = 0;
    }
}

/// Render a field for display.
///
/// `S_AMT` values that parse as numbers are shown rounded and grouped
/// (`1,250,000`). Everything else is shown as its trimmed text.
pub fn display_value(field: &FieldDescriptor, value: &FieldValue) -> String {
    match value.as_number() {
        Some(amount) if field.name == S_AMT => format_amount(amount),
        _ => value.text().to_string(),
    }
}

/// Round to whole units and group thousands with commas.
pub fn format_amount(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
