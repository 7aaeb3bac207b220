//! Error types for DBF reading

use std::io;
use thiserror::Error;

/// Errors that can occur with data sources
#[derive(Debug, Error)]
pub enum SourceError {
    /// File or URL does not resolve
    #[error("Not found: {0}")]
    NotFound(String),
    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// File system error
    #[error("File system error: {0}")]
    FileSystemError(String),
    /// Transport failure or non-success HTTP status
    #[error("Network error{}: {message}", status_suffix(.status))]
    Network {
        /// HTTP status code, when a response was received
        status: Option<u16>,
        /// Human-readable description
        message: String,
    },
    /// Download did not complete in time or stalled between chunks
    #[error("Timed out: {0}")]
    Timeout(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

impl SourceError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Timeout(_) => true,
            SourceError::Network { status: None, .. } => true,
            SourceError::Network {
                status: Some(code),
                ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

/// Top-level reader error type
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Source error
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// The fixed header is too short or structurally invalid
    #[error("Malformed header at offset {offset}: {message}")]
    MalformedHeader { offset: u64, message: String },

    /// The field table disagrees with the declared header/record lengths
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A record's byte range runs past the end of the buffer
    #[error("Truncated record {index} at offset {offset}")]
    TruncatedRecord { index: u32, offset: u64 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Writing output (CSV export) failed
    #[error("Output error: {0}")]
    Io(#[from] io::Error),

    /// A background scan task panicked or was cancelled
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

/// Coarse error categories reported to users.
///
/// Lets callers tell "file not found" apart from "corrupt file" and
/// "network failure" without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Corrupt,
    Network,
    Other,
}

impl ReaderError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReaderError::Source(SourceError::NotFound(_)) => ErrorKind::NotFound,
            ReaderError::Source(SourceError::Network { .. })
            | ReaderError::Source(SourceError::Timeout(_)) => ErrorKind::Network,
            ReaderError::MalformedHeader { .. }
            | ReaderError::SchemaMismatch(_)
            | ReaderError::TruncatedRecord { .. } => ErrorKind::Corrupt,
            _ => ErrorKind::Other,
        }
    }

    pub(crate) fn malformed(offset: u64, message: impl Into<String>) -> Self {
        ReaderError::MalformedHeader {
            offset,
            message: message.into(),
        }
    }
}
