//! Configuration module for Pagechain
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use pagechain::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("pagechain.toml")).unwrap();
//! println!("Sentinel image: {}", config.output.sentinel_path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, NetworkConfig, OutputConfig, RetryConfig, DEFAULT_BAN_MARKER, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::normalize_proxy;
