//! Data source abstractions for DBF files
//!
//! This module provides a unified interface for reading DBF bytes from
//! a local file, an HTTP download held in memory, or an in-memory buffer.

mod http;
mod local;
mod memory;
mod traits;

pub use http::{HttpConfig, HttpSource, DEFAULT_MAX_RETRIES};
pub use local::LocalSource;
pub use memory::MemorySource;
pub use traits::{BoxedSource, StreamSource};

use crate::error::SourceError;

/// Check whether a location should be fetched over HTTP.
pub fn is_http_url(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Open a location as a boxed source.
///
/// `http://` and `https://` locations are downloaded in full with `config`,
/// reporting progress through `on_progress`; anything else is treated as a
/// local path.
pub async fn open_source<F>(
    location: &str,
    config: &HttpConfig,
    on_progress: F,
) -> Result<BoxedSource, SourceError>
where
    F: FnMut(u64, Option<u64>) + Send,
{
    if is_http_url(location) {
        let source = HttpSource::download(location, config, on_progress).await?;
        Ok(Box::new(source))
    } else {
        let source = LocalSource::open(location).await?;
        Ok(Box::new(source))
    }
}
