//! HTTP source implementation
//!
//! Downloads a DBF file over HTTP(S) as a stream of chunks, accumulating them
//! into one contiguous buffer while reporting progress. Once downloaded, the
//! buffer serves positioned reads like any other source.
//!
//! The whole body is held in memory. For files of a few hundred megabytes this
//! is acceptable; bounded-memory access would instead issue range requests at
//! `header_length + index * record_length`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use super::memory::clamped_slice;
use super::traits::StreamSource;
use crate::error::SourceError;

/// Default number of retry attempts for transient download failures.
pub const DEFAULT_MAX_RETRIES: usize = 2;

/// Upper bound on the buffer preallocated from a `Content-Length` header.
const MAX_PREALLOCATION: u64 = 1024 * 1024 * 1024;

/// Configuration options for HTTP downloads.
///
/// # Supported `from_dict` Keys
/// - `timeout_secs`: Overall request timeout
/// - `connect_timeout_secs`: Connection establishment timeout
/// - `stall_timeout_secs`: Longest allowed gap between body chunks
/// - `max_retries`: Retry attempts for transient failures
/// - `user_agent`: Custom `User-Agent` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Overall timeout for one download attempt (default: 10 minutes)
    pub timeout: Duration,
    /// Timeout for establishing the connection (default: 30 seconds)
    pub connect_timeout: Duration,
    /// Longest wait for the next body chunk before giving up (default: 60 seconds)
    pub stall_timeout: Duration,
    /// Maximum retry attempts for transient failures (default: 2)
    pub max_retries: usize,
    /// Delay before the first retry; doubled for each further attempt (default: 250ms)
    pub retry_backoff: Duration,
    /// Custom user agent
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            connect_timeout: Duration::from_secs(30),
            stall_timeout: Duration::from_secs(60),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: Duration::from_millis(250),
            user_agent: None,
        }
    }
}

impl HttpConfig {
    /// Create a new HttpConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config from string options. Unparseable values fall back to defaults.
    pub fn from_dict(opts: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| {
            opts.get(key)
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        Self {
            timeout: secs("timeout_secs", defaults.timeout),
            connect_timeout: secs("connect_timeout_secs", defaults.connect_timeout),
            stall_timeout: secs("stall_timeout_secs", defaults.stall_timeout),
            max_retries: opts
                .get("max_retries")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            retry_backoff: defaults.retry_backoff,
            user_agent: opts.get("user_agent").cloned(),
        }
    }

    /// Set the overall timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the stall timeout between chunks.
    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = timeout;
        self
    }

    /// Set the maximum retry attempts.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the initial retry backoff.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    fn build_client(&self) -> Result<Client, SourceError> {
        let mut builder = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout);
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder.build().map_err(|e| SourceError::Network {
            status: None,
            message: format!("Failed to build HTTP client: {}", e),
        })
    }
}

/// A DBF file downloaded over HTTP and held in memory.
pub struct HttpSource {
    url: String,
    data: Bytes,
}

impl HttpSource {
    /// Download `url` in full.
    ///
    /// `on_progress(bytes_received, total_bytes)` is called after every chunk;
    /// `total_bytes` is `None` when the server sends no `Content-Length`.
    ///
    /// # Errors
    /// - `SourceError::NotFound` for 404/410 responses
    /// - `SourceError::Network` for other non-success statuses and transport errors
    /// - `SourceError::Timeout` when the download times out or stalls
    ///
    /// Transient failures (timeouts, 429, 5xx, connection errors) are retried
    /// up to `config.max_retries` times with exponential backoff.
    pub async fn download<F>(
        url: &str,
        config: &HttpConfig,
        mut on_progress: F,
    ) -> Result<Self, SourceError>
    where
        F: FnMut(u64, Option<u64>) + Send,
    {
        let client = config.build_client()?;
        let mut attempt = 0usize;

        loop {
            match Self::fetch(&client, url, config, &mut on_progress).await {
                Ok(data) => {
                    info!(url = %url, size_bytes = data.len(), "Downloaded DBF file");
                    return Ok(Self {
                        url: url.to_string(),
                        data,
                    });
                }
                Err(e) if e.is_transient() && attempt < config.max_retries => {
                    let delay = config.retry_backoff * 2u32.saturating_pow(attempt as u32);
                    warn!(
                        url = %url,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying DBF download"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch<F>(
        client: &Client,
        url: &str,
        config: &HttpConfig,
        on_progress: &mut F,
    ) -> Result<Bytes, SourceError>
    where
        F: FnMut(u64, Option<u64>) + Send,
    {
        debug!(url = %url, "HTTP GET");

        let mut response = client
            .get(url)
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(SourceError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(SourceError::Network {
                status: Some(status.as_u16()),
                message: format!(
                    "{} for {}",
                    status.canonical_reason().unwrap_or("Request failed"),
                    url
                ),
            });
        }

        let total = response.content_length();
        let mut buffer = BytesMut::with_capacity(total.unwrap_or(0).min(MAX_PREALLOCATION) as usize);

        loop {
            let chunk = tokio::time::timeout(config.stall_timeout, response.chunk())
                .await
                .map_err(|_| {
                    SourceError::Timeout(format!(
                        "No data received from {} for {:?} after {} bytes",
                        url,
                        config.stall_timeout,
                        buffer.len()
                    ))
                })?
                .map_err(|e| map_reqwest_error(url, e))?;

            match chunk {
                Some(chunk) => {
                    buffer.extend_from_slice(&chunk);
                    on_progress(buffer.len() as u64, total);
                }
                None => break,
            }
        }

        if let Some(expected) = total {
            if (buffer.len() as u64) < expected {
                return Err(SourceError::Network {
                    status: None,
                    message: format!(
                        "Body of {} ended after {} of {} bytes",
                        url,
                        buffer.len(),
                        expected
                    ),
                });
            }
        }

        Ok(buffer.freeze())
    }

    /// The URL this source was downloaded from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Borrow the downloaded buffer.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Consume the source and return the downloaded buffer.
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

fn map_reqwest_error(url: &str, err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout(format!("{}: {}", url, err))
    } else {
        SourceError::Network {
            status: err.status().map(|s| s.as_u16()),
            message: format!("{}: {}", url, err),
        }
    }
}

#[async_trait]
impl StreamSource for HttpSource {
    async fn read_range(&self, offset: u64, length: usize) -> Result<Bytes, SourceError> {
        Ok(clamped_slice(&self.data, offset, length))
    }

    async fn size(&self) -> Result<u64, SourceError> {
        Ok(self.data.len() as u64)
    }

    async fn read_from(&self, offset: u64) -> Result<Bytes, SourceError> {
        Ok(clamped_slice(&self.data, offset, usize::MAX))
    }
}

impl std::fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSource")
            .field("url", &self.url)
            .field("size", &self.data.len())
            .finish()
    }
}
