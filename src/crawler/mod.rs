//! Crawler module for walking page chains
//!
//! This module contains the core traversal logic, including:
//! - HTTP fetching with rate-limit and transient-failure classification
//! - Markup parsing behind a swappable strategy
//! - Idempotent image downloading with blocked-image rejection
//! - Page count probing for progress
//! - Chain traversal and single-page retries

mod dom_parser;
mod downloader;
mod fetcher;
mod parser;
mod probe;
mod retry;
mod walker;

pub use dom_parser::DomParser;
pub use downloader::{page_image_path, AssetDownloader, DownloadOutcome, Sentinel};
pub use fetcher::{build_http_client, FetchError, FetchResult, PageFetcher};
pub use parser::{
    MarkupParser, ParsedPage, ParserKind, RegexParser, LOADER_SCRIPT_MARKER, UNKNOWN_TITLE,
};
pub use probe::PageCountProber;
pub use retry::RetryPolicy;
pub use walker::{ChainWalker, RetryReport, WalkOptions};

use std::sync::Arc;

/// Returns the parser implementing `kind`
pub fn parser_for(kind: ParserKind) -> Arc<dyn MarkupParser> {
    match kind {
        ParserKind::Regex => Arc::new(RegexParser),
        ParserKind::Dom => Arc::new(DomParser::new()),
    }
}
