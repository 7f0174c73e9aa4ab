use serde::Deserialize;
use std::collections::HashMap;

/// Default browser-like user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

/// Marker the origin embeds in its body when the client IP is blocked
pub const DEFAULT_BAN_MARKER: &str = "Your IP address has been temporarily banned";

/// Main configuration structure for Pagechain
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Title remap applied to extracted titles (original -> replacement)
    #[serde(default)]
    pub titles: HashMap<String, String>,
}

/// HTTP behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Forward proxy as `host:port` or a full proxy URL; empty means direct
    pub proxy: Option<String>,

    /// User-Agent header value
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Timeout for a single page fetch (milliseconds)
    #[serde(rename = "page-timeout-ms")]
    pub page_timeout_ms: u64,

    /// Timeout for a single asset fetch (milliseconds)
    #[serde(rename = "asset-timeout-ms")]
    pub asset_timeout_ms: u64,

    /// Body substring that classifies a response as rate limited
    #[serde(rename = "ban-marker")]
    pub ban_marker: String,

    /// Referer sent with asset downloads; defaults to the page origin
    pub referer: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_timeout_ms: 8_000,
            asset_timeout_ms: 18_000,
            ban_marker: DEFAULT_BAN_MARKER.to_string(),
            referer: None,
        }
    }
}

/// Transient-failure retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum fetch attempts per page; 0 retries until cancelled
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// First backoff delay (milliseconds)
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    /// Upper bound on the backoff delay (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory under which per-title folders are created
    #[serde(rename = "root-dir")]
    pub root_dir: String,

    /// Known "blocked" placeholder image to reject
    #[serde(rename = "sentinel-path")]
    pub sentinel_path: String,

    /// Extensions (without dot) considered page images, in preference order
    #[serde(rename = "image-extensions")]
    pub image_extensions: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: ".".to_string(),
            sentinel_path: "error.jpg".to_string(),
            image_extensions: ["jpg", "jpeg", "png", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
