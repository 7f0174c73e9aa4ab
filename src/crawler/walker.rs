//! Chain walker - main traversal logic
//!
//! This module drives one traversal from a starting page URL to the end of
//! the chain:
//! - Optionally probing the chain for a total page count
//! - Fetching each page with retries on transient failures
//! - Parsing the page and downloading its image
//! - Following the next-hop token to the following page
//! - Reporting progress and the final outcome
//!
//! It also implements the single-page retry path used to re-attempt the
//! failed pages of an earlier run.

use crate::config::Config;
use crate::crawler::downloader::{AssetDownloader, DownloadOutcome, Sentinel};
use crate::crawler::fetcher::{FetchResult, PageFetcher};
use crate::crawler::parser::{MarkupParser, ParsedPage, RegexParser};
use crate::crawler::probe::PageCountProber;
use crate::crawler::retry::RetryPolicy;
use crate::output::{
    percent_done, sanitize_folder_name, CompletionSink, ProgressEvent, ProgressObserver,
};
use crate::state::{AbortReason, TraversalReport, TraversalState};
use crate::url::{parse_page_url, PageAddress};
use crate::ChainError;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Reason recorded when a page ends the chain although its own count says otherwise
const MISSING_TOKEN_REASON: &str = "next-hop token missing";

/// Per-invocation options for [`ChainWalker::walk`]
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Output folder name, overriding the page title and any title remap
    pub folder_name: Option<String>,

    /// Run the page-count probe before traversing
    pub probe_total: bool,

    /// Process only the starting page, without following the chain
    pub single_page_only: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            folder_name: None,
            probe_total: true,
            single_page_only: false,
        }
    }
}

/// Outcome of a batch of single-page retries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryReport {
    /// URLs whose image is now on disk
    pub recovered: Vec<String>,

    /// URLs that failed again or were never attempted, in input order
    pub still_failed: Vec<String>,

    /// True if the origin rate limited the batch and scheduling stopped
    pub rate_limited: bool,
}

/// How a page fetch ended after retries
enum PageFetch {
    Body(String),
    RateLimited,
    Failed(String),
    Cancelled,
}

/// Walks a page chain and downloads one image per page
///
/// A walker is cheap to clone. Clones share the HTTP client, the sentinel
/// and the cancellation token, which lets batch retries run on separate tasks.
#[derive(Clone)]
pub struct ChainWalker {
    fetcher: Arc<PageFetcher>,
    parser: Arc<dyn MarkupParser>,
    downloader: AssetDownloader,
    prober: PageCountProber,
    retry_policy: RetryPolicy,
    output_root: PathBuf,
    title_map: Arc<HashMap<String, String>>,
    referer: Option<String>,
    observer: Option<Arc<dyn ProgressObserver>>,
    sink: Option<Arc<dyn CompletionSink>>,
    cancel: CancellationToken,
}

impl ChainWalker {
    /// Creates a walker from the configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(ChainWalker)` - Ready to walk
    /// * `Err(ChainError)` - The HTTP client could not be built or the
    ///   sentinel image could not be read
    pub fn new(config: &Config) -> Result<Self, ChainError> {
        let fetcher = Arc::new(PageFetcher::new(&config.network)?);
        let sentinel = Arc::new(Sentinel::load(Path::new(&config.output.sentinel_path))?);
        let parser: Arc<dyn MarkupParser> = Arc::new(RegexParser);

        Ok(Self {
            downloader: AssetDownloader::new(Arc::clone(&fetcher), sentinel),
            prober: PageCountProber::new(Arc::clone(&fetcher), Arc::clone(&parser)),
            fetcher,
            parser,
            retry_policy: RetryPolicy::from(&config.retry),
            output_root: PathBuf::from(&config.output.root_dir),
            title_map: Arc::new(config.titles.clone()),
            referer: config.network.referer.clone(),
            observer: None,
            sink: None,
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the markup parsing strategy
    pub fn with_parser(mut self, parser: Arc<dyn MarkupParser>) -> Self {
        self.prober = PageCountProber::new(Arc::clone(&self.fetcher), Arc::clone(&parser));
        self.parser = parser;
        self
    }

    /// Replaces the sentinel loaded from the configuration
    pub fn with_sentinel(mut self, sentinel: Sentinel) -> Self {
        self.downloader = AssetDownloader::new(Arc::clone(&self.fetcher), Arc::new(sentinel));
        self
    }

    /// Replaces the retry policy for transient failures
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Sets the directory under which work folders are created
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Registers a progress observer
    pub fn with_observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Registers the sink notified when a traversal completes
    pub fn with_completion_sink(mut self, sink: impl CompletionSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Uses `token` to cancel traversals started by this walker
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The token that cancels this walker's traversals
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Walks the chain starting at `start_url`
    ///
    /// # Returns
    ///
    /// * `Ok(TraversalReport)` - The traversal ran; its terminal state and
    ///   per-page failures are in the report
    /// * `Err(ChainError)` - `start_url` is not a page URL
    pub async fn walk(
        &self,
        start_url: &str,
        options: &WalkOptions,
    ) -> Result<TraversalReport, ChainError> {
        let start = parse_page_url(start_url)?;
        let folder_override = options.folder_name.as_deref();

        if options.single_page_only {
            return Ok(self.single_page(&start, folder_override).await);
        }

        // Step 1: Counting
        let total = if options.probe_total {
            self.emit(ProgressEvent::status(0.0, "Counting total pages..."));
            self.prober.probe(&start, &self.cancel).await
        } else {
            0
        };

        if self.cancel.is_cancelled() {
            return Ok(TraversalReport::new(total).finish(TraversalState::Cancelled));
        }

        // Step 2: Traversing
        Ok(self.traverse(start, total, folder_override).await)
    }

    /// Processes exactly one page without following the chain
    ///
    /// This is the retry path for a URL taken from an earlier run's failed
    /// list. The returned report has a total estimate of 1 and no completion
    /// notification is sent.
    pub async fn walk_single(
        &self,
        page_url: &str,
        folder_name: Option<&str>,
    ) -> Result<TraversalReport, ChainError> {
        let address = parse_page_url(page_url)?;
        Ok(self.single_page(&address, folder_name).await)
    }

    /// Estimates the page count from `start_url` to the end of the chain
    pub async fn count_pages(&self, start_url: &str) -> Result<u32, ChainError> {
        let start = parse_page_url(start_url)?;
        Ok(self.prober.probe(&start, &self.cancel).await)
    }

    /// Re-attempts each failed page URL once
    ///
    /// Duplicate URLs are attempted once. At most `concurrency` pages are in
    /// flight at a time. A rate-limit response stops scheduling further pages;
    /// those, like cancelled ones, stay in `still_failed`. Retries never
    /// trigger further retries.
    pub async fn retry_failed(
        &self,
        urls: &[String],
        folder_name: Option<&str>,
        concurrency: usize,
    ) -> RetryReport {
        let mut seen = HashSet::new();
        let unique: Vec<String> = urls
            .iter()
            .filter(|url| seen.insert(url.to_string()))
            .cloned()
            .collect();

        tracing::info!(
            "Retrying {} failed pages (concurrency {})",
            unique.len(),
            concurrency.max(1)
        );

        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let halted = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();

        for (position, url) in unique.iter().enumerate() {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            if halted.load(Ordering::SeqCst) || self.cancel.is_cancelled() {
                break;
            }

            let walker = self.clone();
            let url = url.clone();
            let folder = folder_name.map(str::to_string);
            let halted = Arc::clone(&halted);

            tasks.spawn(async move {
                let _permit = permit;
                let recovered = match walker.walk_single(&url, folder.as_deref()).await {
                    Ok(report) => {
                        if report.state.is_rate_limited() {
                            halted.store(true, Ordering::SeqCst);
                        }
                        report.is_clean()
                    }
                    Err(e) => {
                        tracing::warn!("Skipping retry of {}: {}", url, e);
                        false
                    }
                };
                (position, recovered)
            });
        }

        let mut recovered_flags = vec![false; unique.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, recovered)) => recovered_flags[position] = recovered,
                Err(e) => tracing::error!("Retry task failed: {}", e),
            }
        }

        let mut report = RetryReport {
            rate_limited: halted.load(Ordering::SeqCst),
            ..RetryReport::default()
        };
        for (url, recovered) in unique.into_iter().zip(recovered_flags) {
            if recovered {
                report.recovered.push(url);
            } else {
                report.still_failed.push(url);
            }
        }

        tracing::info!(
            "Retry finished: {} recovered, {} still failing",
            report.recovered.len(),
            report.still_failed.len()
        );
        report
    }

    /// Follows the chain from `start` until it ends or the run stops
    async fn traverse(
        &self,
        start: PageAddress,
        total: u32,
        folder_override: Option<&str>,
    ) -> TraversalReport {
        let start_index = start.identity.page_index;
        let mut report = TraversalReport::new(total);
        let mut current = start;

        tracing::info!("Starting traversal at {}", current.to_url());

        let state = loop {
            if self.cancel.is_cancelled() {
                break TraversalState::Cancelled;
            }

            let page_url = current.to_url();
            let page_index = current.identity.page_index;

            let body = match self.fetch_with_retry(&page_url).await {
                PageFetch::Body(body) => body,
                PageFetch::RateLimited => {
                    tracing::warn!("Rate limited at page {}, aborting traversal", page_index);
                    break TraversalState::Aborted(AbortReason::RateLimited);
                }
                PageFetch::Cancelled => break TraversalState::Cancelled,
                PageFetch::Failed(reason) => {
                    tracing::warn!("Failed to fetch page {}: {}", page_index, reason);
                    report.record_failure(&page_url);
                    self.emit_counts(&report, page_index, start_index, "Page fetch failed");
                    break TraversalState::Truncated { page_index, reason };
                }
            };

            let parsed = self.process_page(&current, &body, folder_override, &mut report).await;
            self.emit_counts(
                &report,
                page_index,
                start_index,
                format!("Processed page {}", page_index),
            );

            match parsed.next_token {
                Some(token) => current = current.advance(token),
                None => {
                    let hint = self.parser.extract_total_page_count(&body);
                    if hint > page_index {
                        tracing::warn!(
                            "Page {} has no next-hop token but reports {} pages",
                            page_index,
                            hint
                        );
                        break TraversalState::Truncated {
                            page_index,
                            reason: MISSING_TOKEN_REASON.to_string(),
                        };
                    }
                    break TraversalState::Completed;
                }
            }
        };

        // An unknown estimate becomes the number of pages actually walked
        if report.total_pages_estimate == 0 {
            report.total_pages_estimate = report.attempted();
        }
        let report = report.finish(state);

        tracing::info!(
            "Traversal {}: {} succeeded, {} failed",
            report.state,
            report.success_count,
            report.failed_count
        );

        if report.state.is_completed() {
            if let (Some(sink), Some(folder), Some(title)) =
                (&self.sink, &report.folder, &report.title)
            {
                sink.on_complete(folder, title, &report);
            }
        }

        report
    }

    /// Fetches, parses and downloads a single page
    async fn single_page(&self, address: &PageAddress, folder_override: Option<&str>) -> TraversalReport {
        let page_url = address.to_url();
        let page_index = address.identity.page_index;
        let mut report = TraversalReport::new(1);

        let state = match self.fetch_with_retry(&page_url).await {
            PageFetch::Body(body) => {
                self.process_page(address, &body, folder_override, &mut report).await;
                TraversalState::Completed
            }
            PageFetch::RateLimited => {
                report.record_failure(&page_url);
                TraversalState::Aborted(AbortReason::RateLimited)
            }
            PageFetch::Cancelled => TraversalState::Cancelled,
            PageFetch::Failed(reason) => {
                report.record_failure(&page_url);
                TraversalState::Truncated { page_index, reason }
            }
        };

        let report = report.finish(state);
        tracing::info!("Single-page retry of {}: {}", page_url, report.state);
        report
    }

    /// Parses a fetched page and stores its image, recording the outcome
    async fn process_page(
        &self,
        address: &PageAddress,
        body: &str,
        folder_override: Option<&str>,
        report: &mut TraversalReport,
    ) -> ParsedPage {
        let page_url = address.to_url();
        let page_index = address.identity.page_index;

        // Step 1: Parse
        let parsed = self.parser.parse_page(body, page_index.saturating_add(1));

        // Step 2: Resolve the destination once per report
        let dest_dir = self.ensure_folder(report, &parsed.title, folder_override);

        // Step 3: Download
        let asset_url = parsed
            .asset_url
            .as_deref()
            .and_then(|src| resolve_asset_url(&page_url, src));

        let outcome = match asset_url {
            Some(asset_url) => {
                let referer = self.referer.as_deref().unwrap_or(address.origin.as_str());
                let outcome = self
                    .downloader
                    .download_asset(&asset_url, referer, &dest_dir, page_index)
                    .await;
                if outcome.used_network() {
                    report.asset_fetches += 1;
                }
                Some(outcome)
            }
            // The image may still be on disk from an earlier run
            None if self.downloader.is_present(&dest_dir, page_index).await => {
                Some(DownloadOutcome::AlreadyPresent)
            }
            None => None,
        };

        // Step 4: Record
        match outcome {
            Some(outcome) if outcome.is_success() => {
                tracing::info!("Page {}: {}", page_index, outcome);
                report.record_success();
            }
            Some(outcome) => {
                tracing::warn!("Page {} failed: {}", page_index, outcome);
                report.record_failure(&page_url);
            }
            None => {
                tracing::warn!("Page {} failed: no image URL found", page_index);
                report.record_failure(&page_url);
            }
        }

        parsed
    }

    /// Fetches a page, retrying timeouts and connection failures
    async fn fetch_with_retry(&self, page_url: &str) -> PageFetch {
        let mut attempts = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                return PageFetch::Cancelled;
            }

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return PageFetch::Cancelled,
                result = self.fetcher.fetch_page(page_url) => result,
            };
            attempts += 1;

            match result {
                FetchResult::Ok { body } => return PageFetch::Body(body),
                FetchResult::RateLimited => return PageFetch::RateLimited,
                FetchResult::OtherError(detail) => return PageFetch::Failed(detail),
                transient => {
                    if !self.retry_policy.allows_retry(attempts) {
                        return PageFetch::Failed(format!("{} after {} attempts", transient, attempts));
                    }

                    let delay = self.retry_policy.delay_for(attempts);
                    tracing::warn!(
                        "{} fetching {} (attempt {}), retrying in {:?}",
                        transient,
                        page_url,
                        attempts,
                        delay
                    );

                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return PageFetch::Cancelled,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// Returns the destination folder, resolving it on the first page
    ///
    /// The folder override wins over the title remap, which wins over the raw
    /// page title.
    fn ensure_folder(
        &self,
        report: &mut TraversalReport,
        page_title: &str,
        folder_override: Option<&str>,
    ) -> PathBuf {
        if let Some(folder) = &report.folder {
            return folder.clone();
        }

        let title = match folder_override.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => self
                .title_map
                .get(page_title)
                .cloned()
                .unwrap_or_else(|| page_title.to_string()),
        };

        let folder = self.output_root.join(sanitize_folder_name(&title));
        tracing::info!("Saving '{}' to {}", title, folder.display());

        report.title = Some(title);
        report.folder = Some(folder.clone());
        folder
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(observer) = &self.observer {
            observer.on_progress(&event);
        }
    }

    fn emit_counts(
        &self,
        report: &TraversalReport,
        page_index: u32,
        start_index: u32,
        status: impl Into<String>,
    ) {
        self.emit(ProgressEvent::with_counts(
            percent_done(
                page_index.saturating_add(1),
                start_index,
                report.total_pages_estimate,
            ),
            status,
            report.success_count,
            report.failed_count,
            report.total_pages_estimate,
        ));
    }
}

/// Resolves a possibly relative image `src` against the page URL
fn resolve_asset_url(page_url: &str, src: &str) -> Option<String> {
    let base = Url::parse(page_url).ok()?;
    base.join(src).ok().map(String::from)
}
