use crate::config::types::{Config, NetworkConfig, OutputConfig, RetryConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_network_config(&config.network)?;
    validate_retry_config(&config.retry)?;
    validate_output_config(&config.output)?;
    validate_titles(config)?;
    Ok(())
}

/// Validates network configuration
fn validate_network_config(config: &NetworkConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.page_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "page_timeout_ms must be > 0".to_string(),
        ));
    }

    if config.asset_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "asset_timeout_ms must be > 0".to_string(),
        ));
    }

    if config.ban_marker.is_empty() {
        return Err(ConfigError::Validation(
            "ban_marker cannot be empty".to_string(),
        ));
    }

    if let Some(proxy) = &config.proxy {
        normalize_proxy(proxy)?;
    }

    if let Some(referer) = &config.referer {
        Url::parse(referer)
            .map_err(|e| ConfigError::Validation(format!("Invalid referer '{}': {}", referer, e)))?;
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.base_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "base_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.base_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.root_dir.is_empty() {
        return Err(ConfigError::Validation(
            "root_dir cannot be empty".to_string(),
        ));
    }

    if config.image_extensions.is_empty() {
        return Err(ConfigError::Validation(
            "image_extensions must list at least one extension".to_string(),
        ));
    }

    for ext in &config.image_extensions {
        if ext.is_empty() || ext.starts_with('.') || ext.contains('/') {
            return Err(ConfigError::Validation(format!(
                "Invalid image extension '{}': use a bare extension like \"jpg\"",
                ext
            )));
        }
    }

    Ok(())
}

/// Validates the title remap table
fn validate_titles(config: &Config) -> Result<(), ConfigError> {
    for (from, to) in &config.titles {
        if to.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Title remap for '{}' cannot be empty",
                from
            )));
        }
    }

    Ok(())
}

/// Normalizes a proxy setting into a proxy URL
///
/// Accepts `host:port` (assumed HTTP) or a full `http://` or `https://` URL.
/// Returns `None` for an empty setting, meaning a direct connection.
///
/// # Examples
///
/// ```
/// use pagechain::config::normalize_proxy;
///
/// assert_eq!(
///     normalize_proxy("127.0.0.1:7890").unwrap(),
///     Some("http://127.0.0.1:7890".to_string())
/// );
/// assert_eq!(normalize_proxy("").unwrap(), None);
/// ```
pub fn normalize_proxy(proxy: &str) -> Result<Option<String>, ConfigError> {
    let proxy = proxy.trim();
    if proxy.is_empty() {
        return Ok(None);
    }

    let candidate = if proxy.contains("://") {
        proxy.to_string()
    } else {
        format!("http://{}", proxy)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| ConfigError::InvalidProxy(format!("'{}': {}", proxy, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidProxy(format!(
            "'{}': unsupported scheme '{}', expected http or https",
            proxy,
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidProxy(format!("'{}' has no host", proxy)));
    }

    if url.port_or_known_default().is_none() {
        return Err(ConfigError::InvalidProxy(format!("'{}' has no port", proxy)));
    }

    Ok(Some(candidate))
}
