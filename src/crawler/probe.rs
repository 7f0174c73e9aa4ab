//! Best-effort page count estimation
//!
//! The estimate only feeds progress reporting. It never decides when a
//! traversal stops.

use crate::crawler::fetcher::{FetchResult, PageFetcher};
use crate::crawler::parser::MarkupParser;
use crate::url::PageAddress;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Estimates how many pages remain in a chain
#[derive(Clone)]
pub struct PageCountProber {
    fetcher: Arc<PageFetcher>,
    parser: Arc<dyn MarkupParser>,
}

impl PageCountProber {
    /// Creates a prober sharing the walker's fetcher and parser
    pub fn new(fetcher: Arc<PageFetcher>, parser: Arc<dyn MarkupParser>) -> Self {
        Self { fetcher, parser }
    }

    /// Estimates the number of pages from `start` to the end of the chain
    ///
    /// # Strategy
    ///
    /// 1. Fetch the start page once and read its embedded total-count hint
    /// 2. If the hint is known, the estimate is `hint - (start_index - 1)`
    /// 3. Otherwise follow the next-hop tokens, counting pages, until the
    ///    chain ends or a fetch does not succeed
    ///
    /// # Returns
    ///
    /// The estimate, or 0 when the start page itself could not be fetched.
    /// A walk interrupted by a failure or cancellation returns the pages
    /// counted so far.
    pub async fn probe(&self, start: &PageAddress, cancel: &CancellationToken) -> u32 {
        let start_index = start.identity.page_index;

        let mut body = match self.fetch(&start.to_url(), cancel).await {
            Some(body) => body,
            None => return 0,
        };

        let hint = self.parser.extract_total_page_count(&body);
        if hint > 0 {
            let remaining = hint.saturating_sub(start_index - 1).max(1);
            tracing::info!("Page count hint: {} total, {} from page {}", hint, remaining, start_index);
            return remaining;
        }

        tracing::debug!("No page count hint, walking the chain to count");
        let mut current = start.clone();
        let mut count = 1;

        while let Some(token) = self
            .parser
            .extract_next_token(&body, current.identity.page_index.saturating_add(1))
        {
            current = current.advance(token);
            body = match self.fetch(&current.to_url(), cancel).await {
                Some(body) => body,
                None => break,
            };
            count += 1;
        }

        tracing::info!("Counted {} pages from page {}", count, start_index);
        count
    }

    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Option<String> {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            result = self.fetcher.fetch_page(url) => result,
        };

        match result {
            FetchResult::Ok { body } => Some(body),
            other => {
                tracing::debug!("Page count probe stopped at {}: {}", url, other);
                None
            }
        }
    }
}
