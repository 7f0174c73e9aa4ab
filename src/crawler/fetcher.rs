//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the walker, including:
//! - Building the HTTP client with the identifying headers and optional proxy
//! - GET requests for page markup, bounded by the page timeout
//! - GET requests for asset bytes, bounded by the asset timeout
//! - Error classification (timeouts, connection failures, rate limiting)
//!
//! No retry logic lives here; the walker owns retries.

use crate::config::{normalize_proxy, NetworkConfig};
use crate::ChainError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::{Client, Proxy};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result of a page fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Successfully fetched the page
    Ok {
        /// Page body content
        body: String,
    },

    /// The request exceeded the page timeout
    TimedOut,

    /// The connection could not be established or was reset
    ConnectionFailed,

    /// The body carried the "temporarily banned" marker
    RateLimited,

    /// Any other failure (HTTP error status, malformed response, ...)
    OtherError(String),
}

impl FetchResult {
    /// Returns true for failures that are worth retrying on the same page
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TimedOut | Self::ConnectionFailed)
    }
}

impl fmt::Display for FetchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok { body } => write!(f, "ok ({} bytes)", body.len()),
            Self::TimedOut => write!(f, "request timed out"),
            Self::ConnectionFailed => write!(f, "connection failed"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::OtherError(detail) => write!(f, "{}", detail),
        }
    }
}

/// Errors from an asset fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

/// Builds an HTTP client with proper configuration
///
/// The client sends a browser-like `User-Agent` and routes every request
/// through the configured forward proxy. Without a proxy the client connects
/// directly and ignores proxy environment variables.
///
/// # Arguments
///
/// * `config` - The network configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(ChainError)` - Invalid proxy or client construction failure
pub fn build_http_client(config: &NetworkConfig) -> Result<Client, ChainError> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,image/*;q=0.9,*/*;q=0.8"),
    );
    default_headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(default_headers)
        .gzip(true)
        .brotli(true);

    let proxy_url = config
        .proxy
        .as_deref()
        .map(normalize_proxy)
        .transpose()?
        .flatten();

    builder = match proxy_url {
        Some(proxy_url) => {
            tracing::info!("Routing requests through proxy {}", proxy_url);
            let proxy = Proxy::all(&proxy_url).map_err(|e| ChainError::Proxy {
                proxy: proxy_url.clone(),
                message: e.to_string(),
            })?;
            builder.proxy(proxy)
        }
        None => builder.no_proxy(),
    };

    Ok(builder.build()?)
}

/// Issues page and asset GET requests with per-call timeouts
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    page_timeout: Duration,
    asset_timeout: Duration,
    ban_marker: String,
}

impl PageFetcher {
    /// Creates a fetcher from the network configuration
    pub fn new(config: &NetworkConfig) -> Result<Self, ChainError> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a fetcher around an existing client
    ///
    /// The client may be shared between fetchers; it is safe for concurrent use.
    pub fn with_client(client: Client, config: &NetworkConfig) -> Self {
        Self {
            client,
            page_timeout: Duration::from_millis(config.page_timeout_ms),
            asset_timeout: Duration::from_millis(config.asset_timeout_ms),
            ban_marker: config.ban_marker.clone(),
        }
    }

    /// Fetches a page and classifies the outcome
    ///
    /// # Classification
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Body contains the ban marker (any status) | `RateLimited` |
    /// | Timeout | `TimedOut` |
    /// | Connection refused / reset | `ConnectionFailed` |
    /// | Non-2xx status | `OtherError("HTTP <code>")` |
    /// | Anything else failing | `OtherError` |
    pub async fn fetch_page(&self, url: &str) -> FetchResult {
        let response = match self
            .client
            .get(url)
            .timeout(self.page_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return classify_page_error(&e),
        };

        let status = response.status();

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return classify_page_error(&e),
        };

        if body.contains(&self.ban_marker) {
            return FetchResult::RateLimited;
        }

        if !status.is_success() {
            return FetchResult::OtherError(format!("HTTP {}", status.as_u16()));
        }

        FetchResult::Ok { body }
    }

    /// Fetches raw asset bytes with the given `Referer`
    pub async fn fetch_asset(&self, url: &str, referer: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .header(REFERER, referer)
            .timeout(self.asset_timeout)
            .send()
            .await
            .map_err(|e| classify_asset_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_asset_error(&e))?;

        Ok(bytes.to_vec())
    }
}

/// Maps a reqwest error to a page fetch result
fn classify_page_error(e: &reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::TimedOut
    } else if e.is_connect() || e.is_body() {
        FetchResult::ConnectionFailed
    } else {
        FetchResult::OtherError(e.to_string())
    }
}

/// Maps a reqwest error to an asset fetch error
fn classify_asset_error(e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_connect() || e.is_body() {
        FetchError::Connect(e.to_string())
    } else {
        FetchError::Other(e.to_string())
    }
}
