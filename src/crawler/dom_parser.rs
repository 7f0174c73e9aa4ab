//! DOM-based markup parser
//!
//! The title comes from a parsed document rather than raw pattern matching.
//! The image location is defined over every `src="..."` occurrence in text
//! order, comments included, and chain tokens and page counts live in inline
//! script and text, so those are delegated to [`RegexParser`].

use crate::crawler::parser::{MarkupParser, RegexParser, UNKNOWN_TITLE};
use scraper::{Html, Selector};

/// [`MarkupParser`] backed by `scraper`
#[derive(Debug, Clone, Copy, Default)]
pub struct DomParser {
    fallback: RegexParser,
}

impl DomParser {
    /// Creates a new DOM parser
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarkupParser for DomParser {
    fn extract_title(&self, body: &str) -> String {
        let document = Html::parse_document(body);

        let Ok(title_selector) = Selector::parse("title") else {
            return UNKNOWN_TITLE.to_string();
        };

        document
            .select(&title_selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
    }

    fn extract_next_token(&self, body: &str, expected_next_index: u32) -> Option<String> {
        self.fallback.extract_next_token(body, expected_next_index)
    }

    fn extract_asset_url(&self, body: &str) -> Option<String> {
        self.fallback.extract_asset_url(body)
    }

    fn extract_total_page_count(&self, body: &str) -> u32 {
        self.fallback.extract_total_page_count(body)
    }
}
