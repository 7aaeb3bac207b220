//! Linear record scans.
//!
//! `scan` walks a window of record indices in either direction, skips deleted
//! records, and keeps the indices whose raw bytes satisfy a compiled
//! [`FilterPredicate`]. The default direction is backward, newest first, so
//! "most recent N" queries stop as soon as the limit is reached.
//!
//! A buffer that ends mid-record is not an error: the window is clamped to
//! the records that are fully present and the cut is reported in
//! [`ScanResult::truncated_at`].

use std::time::Instant;

use tracing::{info, warn};

use crate::reader::{is_deleted, DbfFile};

use super::filter::{CompiledPredicate, FilterPredicate};

/// Scan order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanDirection {
    /// Highest index first (most recently appended records first).
    #[default]
    Backward,
    /// Lowest index first.
    Forward,
}

/// Bounds and order of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Scan order (default: backward).
    pub direction: ScanDirection,
    /// First index of the window, inclusive (default: 0).
    pub start_index: u32,
    /// End of the window, exclusive. Clamped to the record count.
    pub end_index: Option<u32>,
    /// Only scan the last `n` declared records.
    pub recent_window: Option<u32>,
    /// Stop after this many matches.
    pub limit: Option<usize>,
}

impl ScanOptions {
    /// A full backward scan with no limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backward scan over the last `n` records, used for the fast first
    /// pass after a file is loaded.
    pub fn recent(n: u32) -> Self {
        Self {
            recent_window: Some(n),
            ..Self::default()
        }
    }

    /// Set the scan direction.
    pub fn with_direction(mut self, direction: ScanDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Scan lowest index first.
    pub fn forward(self) -> Self {
        self.with_direction(ScanDirection::Forward)
    }

    /// Set the first index of the window.
    pub fn with_start_index(mut self, start_index: u32) -> Self {
        self.start_index = start_index;
        self
    }

    /// Set the exclusive end of the window.
    pub fn with_end_index(mut self, end_index: u32) -> Self {
        self.end_index = Some(end_index);
        self
    }

    /// Limit the scan to the last `n` declared records.
    pub fn with_recent_window(mut self, n: u32) -> Self {
        self.recent_window = Some(n);
        self
    }

    /// Stop after `limit` matches.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The `[start, end)` window for a file declaring `record_count` records.
    pub fn window(&self, record_count: u32) -> (u32, u32) {
        let end = self
            .end_index
            .map_or(record_count, |end| end.min(record_count));
        let start = match self.recent_window {
            Some(n) => self.start_index.max(record_count.saturating_sub(n)),
            None => self.start_index,
        };
        (start.min(end), end)
    }
}

/// Matching record indices plus scan statistics.
///
/// Holds indices only; records are decoded on demand from the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Matching indices in scan order.
    pub indices: Vec<u32>,
    /// Record slots examined, deleted ones included.
    pub records_visited: u64,
    /// Whether the scan stopped because `limit` matches were found.
    pub limit_reached: bool,
    /// First unreadable index when the buffer ended inside the window.
    pub truncated_at: Option<u32>,
}

impl ScanResult {
    /// Number of matches.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Matching indices in scan order.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Take the index list.
    pub fn into_indices(self) -> Vec<u32> {
        self.indices
    }
}

/// Scan `file` for records matching `predicate`.
///
/// The predicate is compiled against the file's schema once, then evaluated
/// on each candidate's raw field bytes. Deleted records never match.
///
/// # Arguments
/// * `file` - The loaded DBF file
/// * `predicate` - Clauses every kept record must satisfy
/// * `options` - Window, direction and limit
///
/// # Returns
/// The matching indices in scan order. Identical inputs always produce an
/// identical result.
pub fn scan(file: &DbfFile, predicate: &FilterPredicate, options: &ScanOptions) -> ScanResult {
    let compiled = predicate.compile(file.schema());
    scan_compiled(file, &compiled, options)
}

/// Scan with a predicate that is already compiled against `file`'s schema.
pub fn scan_compiled(
    file: &DbfFile,
    predicate: &CompiledPredicate,
    options: &ScanOptions,
) -> ScanResult {
    let started = Instant::now();
    let header = file.header();
    let (start, declared_end) = options.window(header.record_count);

    let readable = file.readable_records();
    let end = declared_end.min(readable);
    let truncated_at = (readable < declared_end).then_some(readable);
    if let Some(cut) = truncated_at {
        warn!(
            cut_at = cut,
            window_end = declared_end,
            "Scan window runs past the end of the buffer; stopping at last complete record"
        );
    }

    let mut result = ScanResult {
        truncated_at,
        ..ScanResult::default()
    };

    let visit = |indices: &mut dyn Iterator<Item = u32>, result: &mut ScanResult| {
        let bytes = file.bytes();
        for index in indices {
            if options.limit.is_some_and(|limit| result.indices.len() >= limit) {
                break;
            }
            result.records_visited += 1;

            let offset = header.record_offset(index);
            if is_deleted(bytes, offset) {
                continue;
            }
            if predicate.matches(bytes, offset) {
                result.indices.push(index);
            }
        }
    };

    match options.direction {
        ScanDirection::Backward => visit(&mut (start.min(end)..end).rev(), &mut result),
        ScanDirection::Forward => visit(&mut (start.min(end)..end), &mut result),
    }

    result.limit_reached = options
        .limit
        .is_some_and(|limit| result.indices.len() >= limit);

    info!(
        direction = ?options.direction,
        window_start = start,
        window_end = end,
        visited = result.records_visited,
        matches = result.indices.len(),
        limit_reached = result.limit_reached,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Scan complete"
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sales_file, DbfFixture};

    fn amounts_file(amounts: &[&str], deleted: &[usize]) -> DbfFile {
        let mut fixture = DbfFixture::new().numeric("AMT", 10, 2);
        for (i, amount) in amounts.iter().enumerate() {
            fixture = if deleted.contains(&i) {
                fixture.deleted_record(&[amount])
            } else {
                fixture.record(&[amount])
            };
        }
        DbfFile::from_bytes(fixture.build()).unwrap()
    }

    #[test]
    fn test_backward_scan_is_newest_first() {
        let file = DbfFile::from_bytes(sales_file()).unwrap();
        let result = scan(&file, &FilterPredicate::new(), &ScanOptions::new());
        assert_eq!(result.indices, vec![3, 1, 0]);
        assert_eq!(result.records_visited, 4);
        assert!(!result.limit_reached);
        assert_eq!(result.truncated_at, None);
    }

    #[test]
    fn test_forward_scan() {
        let file = DbfFile::from_bytes(sales_file()).unwrap();
        let result = scan(&file, &FilterPredicate::new(), &ScanOptions::new().forward());
        assert_eq!(result.indices, vec![0, 1, 3]);
    }

    #[test]
    fn test_predicate_filters_indices() {
        let file = DbfFile::from_bytes(sales_file()).unwrap();
        let predicate = FilterPredicate::new()
            .equals("NBHC", "100200")
            .min_number("S_AMT", 10_000.0);
        let result = scan(&file, &predicate, &ScanOptions::new());
        assert_eq!(result.indices, vec![0]);
    }

    #[test]
    fn test_limit_keeps_highest_indices() {
        let file = amounts_file(&["1", "2", "3", "4", "5"], &[3]);
        let result = scan(&file, &FilterPredicate::new(), &ScanOptions::new().with_limit(2));
        assert_eq!(result.indices, vec![4, 2]);
        assert!(result.limit_reached);
        assert_eq!(result.records_visited, 3);
    }

    #[test]
    fn test_limit_zero_visits_nothing() {
        let file = amounts_file(&["1", "2"], &[]);
        let result = scan(&file, &FilterPredicate::new(), &ScanOptions::new().with_limit(0));
        assert!(result.is_empty());
        assert!(result.limit_reached);
        assert_eq!(result.records_visited, 0);
    }

    #[test]
    fn test_window_bounds() {
        let file = amounts_file(&["1", "2", "3", "4", "5"], &[]);
        let options = ScanOptions::new().with_start_index(1).with_end_index(3);
        assert_eq!(scan(&file, &FilterPredicate::new(), &options).indices, vec![2, 1]);

        let past_end = ScanOptions::new().with_start_index(3).with_end_index(100);
        assert_eq!(scan(&file, &FilterPredicate::new(), &past_end).indices, vec![4, 3]);

        let empty = ScanOptions::new().with_start_index(4).with_end_index(2);
        assert!(scan(&file, &FilterPredicate::new(), &empty).is_empty());
    }

    #[test]
    fn test_recent_window() {
        let file = amounts_file(&["1", "2", "3", "4", "5"], &[]);
        let result = scan(&file, &FilterPredicate::new(), &ScanOptions::recent(2));
        assert_eq!(result.indices, vec![4, 3]);

        let all = scan(&file, &FilterPredicate::new(), &ScanOptions::recent(5000));
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_recent_window_counts_declared_records() {
        let mut fixture = DbfFixture::new().numeric("AMT", 10, 2).record_count(7);
        for amount in ["1", "2", "3", "4", "5"] {
            fixture = fixture.record(&[amount]);
        }
        let file = DbfFile::from_bytes(fixture.build()).unwrap();
        assert_eq!(file.readable_records(), 5);

        let result = scan(&file, &FilterPredicate::new(), &ScanOptions::recent(3));
        assert_eq!(result.indices, vec![4]);
        assert_eq!(result.truncated_at, Some(5));
    }

    #[test]
    fn test_min_amount_example() {
        let mut bytes = DbfFixture::new()
            .numeric("AMT", 10, 2)
            .record_length(21)
            .header_length(97)
            .build();
        // Left-aligned amounts with trailing padding, as they appear on disk.
        let records: [&[u8; 21]; 3] = [
            b" 100.00              ",
            b"*deleted             ",
            b" 250.50              ",
        ];
        bytes.pop();
        for record in records {
            bytes.extend_from_slice(record);
        }
        bytes[4..8].copy_from_slice(&3u32.to_le_bytes());

        let file = DbfFile::from_bytes(bytes).unwrap();
        let predicate = FilterPredicate::new().min_number("AMT", 200.0);
        assert_eq!(scan(&file, &predicate, &ScanOptions::new()).indices, vec![2]);
    }

    #[test]
    fn test_truncated_buffer_stops_silently() {
        let mut bytes = sales_file();
        bytes.truncate(bytes.len() - 5);
        let file = DbfFile::from_bytes(bytes).unwrap();

        let backward = scan(&file, &FilterPredicate::new(), &ScanOptions::new());
        assert_eq!(backward.indices, vec![1, 0]);
        assert_eq!(backward.truncated_at, Some(3));

        let forward = scan(&file, &FilterPredicate::new(), &ScanOptions::new().forward());
        assert_eq!(forward.indices, vec![0, 1]);
    }

    #[test]
    fn test_scan_is_deterministic() {
        let file = DbfFile::from_bytes(sales_file()).unwrap();
        let predicate = FilterPredicate::new().contains("GRANTEE", "o");
        let first = scan(&file, &predicate, &ScanOptions::new());
        let second = scan(&file, &predicate, &ScanOptions::new());
        assert_eq!(first, second);
    }

    #[test]
    fn test_options_window() {
        assert_eq!(ScanOptions::new().window(10), (0, 10));
        assert_eq!(ScanOptions::recent(3).window(10), (7, 10));
        assert_eq!(ScanOptions::recent(30).window(10), (0, 10));
        assert_eq!(
            ScanOptions::recent(3).with_start_index(8).window(10),
            (8, 10)
        );
        assert_eq!(ScanOptions::new().with_end_index(4).window(10), (0, 4));
        assert_eq!(ScanOptions::new().with_recent_window(3), ScanOptions::recent(3));
    }
}
