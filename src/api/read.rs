//! Opening DBF files by location.
//!
//! A location is either a local path or an `http(s)://` URL. URLs are
//! downloaded in full before parsing; local files are read directly.

use std::sync::Arc;

use crate::error::ReaderError;
use crate::reader::{DbfFile, RecordReader};
use crate::schema::Schema;
use crate::source::{open_source, BoxedSource, HttpConfig};

/// Load a DBF file from a path or URL.
///
/// # Arguments
/// * `location` - Local path or `http(s)://` URL
/// * `config` - HTTP settings, unused for local paths
/// * `on_progress` - Called with `(bytes_received, total_bytes)` per
///   downloaded chunk
///
/// # Errors
/// - `ReaderError::Source` if the location cannot be read or downloaded
/// - `ReaderError::MalformedHeader` / `ReaderError::SchemaMismatch` if the
///   bytes are not a usable DBF file
///
/// # Example
/// ```no_run
/// use dbfscan::api::open_dbf;
/// use dbfscan::source::HttpConfig;
///
/// # async fn example() -> Result<(), dbfscan::ReaderError> {
/// let file = open_dbf("DBF/allsales.dbf", &HttpConfig::default(), |_, _| {}).await?;
/// println!("{} records", file.record_count());
/// # Ok(())
/// # }
/// ```
pub async fn open_dbf<F>(
    location: &str,
    config: &HttpConfig,
    on_progress: F,
) -> Result<DbfFile, ReaderError>
where
    F: FnMut(u64, Option<u64>) + Send,
{
    let source = open_source(location, config, on_progress).await?;
    DbfFile::open(&source).await
}

/// Open a location for positioned record reads without loading it whole.
///
/// URLs are still downloaded in full.
pub async fn open_reader(
    location: &str,
    config: &HttpConfig,
) -> Result<RecordReader<BoxedSource>, ReaderError> {
    let source = open_source(location, config, |_, _| {}).await?;
    RecordReader::open(source).await
}

/// Read only the field schema of a DBF file.
pub async fn read_dbf_schema(
    location: &str,
    config: &HttpConfig,
) -> Result<Arc<Schema>, ReaderError> {
    let reader = open_reader(location, config).await?;
    Ok(Arc::clone(reader.schema()))
}
