//! Pagechain: a resumable downloader for link-chained image pages
//!
//! This crate walks a chain of remote pages where each page names the token
//! needed to fetch the next one, downloads the image embedded in every page,
//! and stores it as `<pageIndex>.jpg` inside a folder named after the work.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Pagechain operations
///
/// These errors only surface while setting a traversal up. Once a traversal
/// is running, every per-page failure is captured in the
/// [`TraversalReport`](state::TraversalReport) instead.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid proxy '{proxy}': {message}")]
    Proxy { proxy: String, message: String },

    #[error("Failed to load sentinel image {path}: {source}")]
    Sentinel {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid proxy in config: {0}")]
    InvalidProxy(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),

    #[error("URL path does not match /s/<token>/<book>-<page>: {0}")]
    NotAPageUrl(String),

    #[error("Page index must be >= 1 in {0}")]
    InvalidPageIndex(String),
}

/// Result type alias for Pagechain operations
pub type Result<T> = std::result::Result<T, ChainError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{ChainWalker, RetryReport, WalkOptions};
pub use state::{AbortReason, TraversalReport, TraversalState};
pub use crate::url::{build_page_url, parse_page_url, PageIdentity};
