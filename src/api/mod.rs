//! Public API module for dbfscan.
//!
//! This module provides scanning, filtering, paging and export over loaded
//! DBF files.
//!
//! # Module Structure
//! - `read`: Opening files by path or URL
//! - `filter`: Filter predicates evaluated on raw record bytes
//! - `scan`: Backward/forward scans producing index lists
//! - `session`: Last-write-wins active scan result
//! - `batch`: Lazy batch decoding and display formatting
//! - `export`: CSV export
//! - `sales`: Sales explorer filters and comps lookup
//! - `fields`: Well-known county field names
//! - `options`: Explorer options

pub mod batch;
pub mod export;
pub mod fields;
pub mod filter;
pub mod options;
pub mod read;
pub mod sales;
pub mod scan;
pub mod session;

// Re-export main types
pub use batch::{display_value, format_amount, materialize_batch, BatchCursor, DEFAULT_BATCH_SIZE};
pub use export::{export_csv, write_csv, PROGRESS_INTERVAL};
pub use fields::field_description;
pub use filter::{normalize_date, Clause, CompiledPredicate, FilterPredicate};
pub use options::ExplorerOptions;
pub use sales::{find_comps, CompsCriteria, SalesFilter};
pub use scan::{scan, scan_compiled, ScanDirection, ScanOptions, ScanResult};
pub use session::ScanSession;

// Re-export public API functions
pub use read::{open_dbf, open_reader, read_dbf_schema};
