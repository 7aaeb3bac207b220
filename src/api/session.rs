//! Active scan result with last-write-wins replacement.
//!
//! An interactive explorer re-runs its filter whenever the criteria change,
//! often before the previous scan has finished. `ScanSession` numbers every
//! run; a finished scan installs its result only if no newer run has started
//! since, so a slow stale scan can never overwrite a fresher one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ReaderError;
use crate::reader::DbfFile;

use super::filter::FilterPredicate;
use super::scan::{scan, ScanOptions, ScanResult};

/// Holds the active scan result for one file.
///
/// Cloning shares the same session.
#[derive(Debug, Clone)]
pub struct ScanSession {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    file: DbfFile,
    generation: AtomicU64,
    active: Mutex<Option<Arc<ScanResult>>>,
}

impl ScanSession {
    /// Start a session over `file` with no active result.
    pub fn new(file: DbfFile) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                file,
                generation: AtomicU64::new(0),
                active: Mutex::new(None),
            }),
        }
    }

    /// The file this session scans.
    pub fn file(&self) -> &DbfFile {
        &self.inner.file
    }

    /// Number of runs started so far.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// The most recently installed result.
    pub async fn active(&self) -> Option<Arc<ScanResult>> {
        self.inner.active.lock().await.clone()
    }

    /// Mark every in-flight run as stale without starting a new one.
    pub fn invalidate(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Run a scan and make its result active unless a newer run started first.
    ///
    /// Yields once before scanning so the caller can update its display, then
    /// runs the scan to completion on the blocking thread pool.
    ///
    /// # Returns
    /// `Some(result)` if this run's result was installed, `None` if it was
    /// superseded and discarded.
    ///
    /// # Errors
    /// `ReaderError::TaskFailed` if the scan task panicked.
    pub async fn run(
        &self,
        predicate: FilterPredicate,
        options: ScanOptions,
    ) -> Result<Option<Arc<ScanResult>>, ReaderError> {
        let ticket = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::task::yield_now().await;

        let file = self.inner.file.clone();
        let result = tokio::task::spawn_blocking(move || scan(&file, &predicate, &options))
            .await
            .map_err(|e| ReaderError::TaskFailed(e.to_string()))?;
        let result = Arc::new(result);

        let mut active = self.inner.active.lock().await;
        if self.inner.generation.load(Ordering::SeqCst) != ticket {
            debug!(ticket, matches = result.len(), "Discarding superseded scan result");
            return Ok(None);
        }
        *active = Some(Arc::clone(&result));
        Ok(Some(result))
    }
}
