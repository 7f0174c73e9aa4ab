use crate::state::TraversalState;
use std::collections::HashSet;
use std::path::PathBuf;

/// Accumulated outcome of one traversal
///
/// A report is owned by exactly one traversal run and only mutated by the
/// walker driving it. The failed URL list keeps encounter order and may
/// contain duplicates while the run is active; [`TraversalReport::finish`]
/// de-duplicates it before the report is handed back.
#[derive(Debug, Clone)]
pub struct TraversalReport {
    /// Where the traversal ended (or is currently)
    pub state: TraversalState,

    /// Pages whose image is on disk (saved now or already present)
    pub success_count: u32,

    /// Pages recorded as failed
    pub failed_count: u32,

    /// Best-effort denominator for progress reporting (0 = unknown)
    pub total_pages_estimate: u32,

    /// Page URLs suitable for re-submission to the single-page retry path
    pub failed_page_urls: Vec<String>,

    /// Resolved title (after remap and override)
    pub title: Option<String>,

    /// Directory the images were written to
    pub folder: Option<PathBuf>,

    /// Pages for which an asset download was actually attempted over the network
    pub asset_fetches: u32,
}

impl TraversalReport {
    /// Creates an empty report in the `Traversing` state
    pub fn new(total_pages_estimate: u32) -> Self {
        Self {
            state: TraversalState::Traversing,
            success_count: 0,
            failed_count: 0,
            total_pages_estimate,
            failed_page_urls: Vec::new(),
            title: None,
            folder: None,
            asset_fetches: 0,
        }
    }

    /// Records a successful page
    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    /// Records a failed page by URL
    pub fn record_failure(&mut self, page_url: &str) {
        self.failed_count += 1;
        self.failed_page_urls.push(page_url.to_string());
    }

    /// Total pages attempted so far
    pub fn attempted(&self) -> u32 {
        self.success_count + self.failed_count
    }

    /// Returns true if the run reached the end of the chain with no failures
    pub fn is_clean(&self) -> bool {
        self.state.is_completed() && self.failed_page_urls.is_empty()
    }

    /// Finalizes the report with its terminal state
    ///
    /// Removes duplicate failed URLs while keeping first-seen order.
    pub fn finish(mut self, state: TraversalState) -> Self {
        self.state = state;
        let mut seen = HashSet::new();
        self.failed_page_urls.retain(|url| seen.insert(url.clone()));
        self
    }
}
