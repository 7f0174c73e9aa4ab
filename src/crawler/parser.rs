//! Page markup parser for extracting chain data
//!
//! This module handles pulling the data the walker needs out of a page body:
//! - Document title (names the output folder)
//! - Next-hop chain token for the following page
//! - Direct URL of the page image
//! - Total page count hint (progress denominator only)
//!
//! Extraction sits behind the [`MarkupParser`] trait so the matching strategy
//! can change without touching the walker. [`RegexParser`] is the default;
//! [`DomParser`](crate::crawler::DomParser) reads the title from a parsed DOM.
//! Both strategies decode character references through the same HTML
//! tokenizer, so they always agree on titles and image URLs.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

/// Title used when a page has no usable `<title>`
pub const UNKNOWN_TITLE: &str = "Unknown";

/// The image is the `src` that directly follows the loader script with this suffix
pub const LOADER_SCRIPT_MARKER: &str = "jads.js";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

static LOAD_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"load_image\(\s*(\d+)\s*,\s*'([^']*)'\s*\)").unwrap());

static SRC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"src="([^"]*)""#).unwrap());

static SPAN_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<span>(\d+)</span>\s*/\s*<span>(\d+)</span>").unwrap());

static SLASH_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s>])/\s*(\d+)\b").unwrap());

static NAV_BLOCK_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<div[^>]*class="sn"[^>]*>.*?<span[^>]*>\s*(\d+)\s*</span>\s*/\s*<span[^>]*>\s*(\d+)\s*</span>"#,
    )
    .unwrap()
});

/// Data extracted from a single page body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    /// The page title, or [`UNKNOWN_TITLE`]
    pub title: String,

    /// Token for the next page; `None` means end of chain
    pub next_token: Option<String>,

    /// Image URL; `None` is a parse failure for this page
    pub asset_url: Option<String>,
}

/// Extraction strategy for page markup
///
/// Implementations are pure and stateless: the same body always yields the
/// same result, and no method fails. Absence is expressed through `Option`
/// or the documented fallbacks.
pub trait MarkupParser: Send + Sync {
    /// Text of the first `<title>` element, trimmed; [`UNKNOWN_TITLE`] if absent
    fn extract_title(&self, body: &str) -> String;

    /// Token captured from `load_image(<expected_next_index>, '<token>')`
    ///
    /// Only the call tagged with exactly `expected_next_index` counts; pages
    /// embed calls for other indices (thumbnails, prefetch hints).
    fn extract_next_token(&self, body: &str, expected_next_index: u32) -> Option<String>;

    /// The `src` value that immediately follows the loader script reference
    fn extract_asset_url(&self, body: &str) -> Option<String>;

    /// Total pages in the work as reported by the page, 0 when unknown
    fn extract_total_page_count(&self, body: &str) -> u32;

    /// Extracts everything the walker needs from one page
    fn parse_page(&self, body: &str, expected_next_index: u32) -> ParsedPage {
        ParsedPage {
            title: self.extract_title(body),
            next_token: self.extract_next_token(body, expected_next_index),
            asset_url: self.extract_asset_url(body),
        }
    }
}

/// Which extraction strategy to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParserKind {
    /// Pattern matching over the raw body
    #[default]
    Regex,
    /// Structural scan over a parsed DOM
    Dom,
}

impl std::str::FromStr for ParserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "regex" => Ok(Self::Regex),
            "dom" => Ok(Self::Dom),
            other => Err(format!("unknown parser '{}', expected 'regex' or 'dom'", other)),
        }
    }
}

/// Regex-based [`MarkupParser`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexParser;

impl MarkupParser for RegexParser {
    fn extract_title(&self, body: &str) -> String {
        TITLE_RE
            .captures(body)
            .map(|caps| decode_title_text(&caps[1]).trim().to_string())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
    }

    fn extract_next_token(&self, body: &str, expected_next_index: u32) -> Option<String> {
        LOAD_IMAGE_RE
            .captures_iter(body)
            .find(|caps| caps[1].parse::<u32>().ok() == Some(expected_next_index))
            .map(|caps| caps[2].to_string())
    }

    fn extract_asset_url(&self, body: &str) -> Option<String> {
        let sources: Vec<&str> = SRC_RE
            .captures_iter(body)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();
        asset_after_loader(&sources).map(|src| decode_attribute_value(&src))
    }

    fn extract_total_page_count(&self, body: &str) -> u32 {
        // 1. `<span>current</span> / <span>total</span>`
        if let Some(total) = SPAN_COUNT_RE
            .captures(body)
            .and_then(|caps| caps[2].parse::<u32>().ok())
            .filter(|total| *total > 0)
        {
            return total;
        }

        // 2. Largest number following a standalone slash
        if let Some(total) = SLASH_NUMBER_RE
            .captures_iter(body)
            .filter_map(|caps| caps[1].parse::<u32>().ok())
            .max()
            .filter(|total| *total > 0)
        {
            return total;
        }

        // 3. Span pair inside the navigation block, attributes allowed
        NAV_BLOCK_COUNT_RE
            .captures(body)
            .and_then(|caps| caps[2].parse::<u32>().ok())
            .unwrap_or(0)
    }
}

/// Picks the source that directly follows the loader script
fn asset_after_loader(sources: &[&str]) -> Option<String> {
    let marker = sources
        .iter()
        .position(|src| src.ends_with(LOADER_SCRIPT_MARKER))?;
    sources
        .get(marker + 1)
        .filter(|src| !src.is_empty())
        .map(|src| src.to_string())
}

/// Decodes character references in raw `<title>` content
///
/// The text is run through the HTML parser as the content of a `title`
/// element, so every named and numeric reference decodes exactly as it does
/// when the whole page is parsed into a DOM.
pub(crate) fn decode_title_text(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let Ok(selector) = Selector::parse("title") else {
        return raw.to_string();
    };
    let document = Html::parse_document(&format!("<title>{}</title>", raw));
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect())
        .unwrap_or_else(|| raw.to_string())
}

/// Decodes character references in a raw double-quoted attribute value
pub(crate) fn decode_attribute_value(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let Ok(selector) = Selector::parse("img") else {
        return raw.to_string();
    };
    let fragment = Html::parse_fragment(&format!(r#"<img src="{}">"#, raw));
    fragment
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("src"))
        .map(str::to_string)
        .unwrap_or_else(|| raw.to_string())
}
