//! # Download Module
//!
//! Validates and fetches photo content, caching bytes per scan.
//!
//! ## Contract
//! - At most one network fetch per item per scan; later requests hit the cache
//! - `download_count` increments once per successful fetch, never on cache hit
//! - URLs are validated before any network call (see [`validate`])
//!
//! The fetcher is a one-method capability object: production uses the
//! validating HTTPS implementation, tests inject an in-memory variant that
//! bypasses validation and networking but still populates the cache.

pub mod validate;

pub use validate::{is_allowed_host, is_globally_routable, validate_download_url};

use crate::config::ScanSettings;
use crate::core::model::PhotoItem;
use crate::error::DownloadError;
use bytes::Bytes;
use std::collections::HashMap;
use tracing::debug;

/// Capability to fetch the content bytes for one photo item
pub trait Fetcher: Send + Sync {
    fn fetch(&self, item: &PhotoItem) -> Result<Bytes, DownloadError>;
}

/// Validating HTTPS fetcher used in production
pub struct HttpsFetcher {
    client: reqwest::blocking::Client,
    headers: Vec<(String, String)>,
    allowed_hosts: Vec<String>,
}

impl HttpsFetcher {
    /// Build a fetcher from the configured allowlist, headers and timeout
    pub fn new(
        allowed_hosts: Vec<String>,
        headers: Vec<(String, String)>,
        timeout: std::time::Duration,
    ) -> crate::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                crate::ScanEngineError::Config(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self {
            client,
            headers,
            allowed_hosts,
        })
    }
}

impl Fetcher for HttpsFetcher {
    fn fetch(&self, item: &PhotoItem) -> Result<Bytes, DownloadError> {
        let url = item
            .download_url
            .as_deref()
            .ok_or_else(|| DownloadError::MissingUrl {
                id: item.id.clone(),
            })?;

        validate_download_url(url, &self.allowed_hosts)?;

        let mut request = self.client.get(url);
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        let fetch_failed = |reason: String| DownloadError::FetchFailed {
            url: url.to_string(),
            reason,
        };

        let response = request.send().map_err(|e| fetch_failed(e.to_string()))?;
        let response = response
            .error_for_status()
            .map_err(|e| fetch_failed(e.to_string()))?;
        response.bytes().map_err(|e| fetch_failed(e.to_string()))
    }
}

/// Per-scan byte cache in front of a fetcher.
///
/// Owned by exactly one scan; dropped with it.
pub struct DownloadManager {
    fetcher: Box<dyn Fetcher>,
    cache: HashMap<String, Bytes>,
    download_count: u64,
}

impl DownloadManager {
    /// Create a manager over any fetcher implementation
    pub fn new(fetcher: Box<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            cache: HashMap::new(),
            download_count: 0,
        }
    }

    /// Create a manager over the validating HTTPS fetcher
    pub fn over_https(settings: &ScanSettings) -> crate::Result<Self> {
        let fetcher = HttpsFetcher::new(
            settings.scan_allowed_download_hosts.clone(),
            Vec::new(),
            settings.download_timeout,
        )?;
        Ok(Self::new(Box::new(fetcher)))
    }

    /// Fetch the content bytes for an item, serving repeats from the cache
    pub fn get_bytes(&mut self, item: &PhotoItem) -> Result<Bytes, DownloadError> {
        if let Some(cached) = self.cache.get(&item.id) {
            return Ok(cached.clone());
        }
        let data = self.fetcher.fetch(item)?;
        debug!(id = %item.id, bytes = data.len(), "fetched photo content");
        self.cache.insert(item.id.clone(), data.clone());
        self.download_count += 1;
        Ok(data)
    }

    /// Number of successful fetches performed (cache hits excluded)
    pub fn download_count(&self) -> u64 {
        self.download_count
    }
}
