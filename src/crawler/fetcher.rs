//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests, including:
//! - Building HTTP clients with the configured user agent and headers
//! - GET requests with a per-request timeout
//! - Error classification (network, timeout, HTTP status)
//!
//! The fetcher never retries on its own; wrap calls in a
//! [`RetryPolicy`](crate::crawler::RetryPolicy) for that.

use crate::config::FetcherConfig;
use crate::crawler::Document;
use crate::{ConfigError, HarvestError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// A successfully fetched response body
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Response body
    pub body: String,
}

impl FetchedPage {
    /// Parses the body into a document rooted at the final URL
    pub fn into_document(self) -> Document {
        Document::parse(&self.body, self.final_url)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(HarvestError)` - A header was invalid or the client failed to build
///
/// # Example
///
/// ```no_run
/// use sumi_harvest::config::FetcherConfig;
/// use sumi_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, HarvestError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ConfigError::Validation(format!("invalid header name '{}': {}", name, e))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            ConfigError::Validation(format!("invalid value for header '{}': {}", name, e))
        })?;
        headers.insert(name, value);
    }

    let client = Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Issues GET requests and turns responses into documents
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    /// Creates a fetcher from configuration
    pub fn new(config: &FetcherConfig) -> Result<Self, HarvestError> {
        Ok(Self {
            client: build_http_client(config)?,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches a URL and returns its body
    ///
    /// # Error Classification
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Malformed URL | `UrlParse` |
    /// | Request exceeded the timeout | `Timeout` |
    /// | Connection refused, DNS, TLS, body read failure | `Network` |
    /// | Non-2xx status | `HttpStatus` |
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage, HarvestError> {
        let parsed = Url::parse(url)?;

        let response = self
            .client
            .get(parsed)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(HarvestError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| classify_error(url, e))?;

        tracing::debug!(
            "Fetched {} ({} bytes, status {})",
            final_url,
            body.len(),
            status.as_u16()
        );

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            body,
        })
    }

    /// Fetches a URL and parses it into a document
    pub async fn fetch(&self, url: &str) -> Result<Document, HarvestError> {
        Ok(self.fetch_page(url).await?.into_document())
    }
}

/// Maps a reqwest error onto the crate's error taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> HarvestError {
    if error.is_timeout() {
        HarvestError::Timeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Network {
            url: url.to_string(),
            source: error,
        }
    }
}
