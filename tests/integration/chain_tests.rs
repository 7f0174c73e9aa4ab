//! Integration tests for the chain walker
//!
//! These tests use wiremock to serve a chain of pages and their images and
//! run full traversals end-to-end into temporary directories.

use pagechain::config::{Config, RetryConfig};
use pagechain::crawler::{parser_for, ParserKind, Sentinel};
use pagechain::output::{CompletionSink, ProgressEvent};
use pagechain::{AbortReason, ChainWalker, TraversalReport, TraversalState, WalkOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOOK: &str = "555";
const TITLE: &str = "Sample Work";
const SENTINEL: &[u8] = b"\xFF\xD8blocked-placeholder\xFF\xD9";
const BAN_PAGE: &str =
    "<html><body>Your IP address has been temporarily banned for excessive pageloads.</body></html>";

/// Creates a walker writing under `root` with short timeouts and fast retries
fn test_walker(root: &Path) -> ChainWalker {
    ChainWalker::new(&test_config(root)).expect("Failed to build walker")
}

fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.network.page_timeout_ms = 500;
    config.network.asset_timeout_ms = 500;
    config.retry = RetryConfig {
        max_attempts: 0,
        base_delay_ms: 10,
        max_delay_ms: 50,
    };
    config.output.root_dir = root.display().to_string();
    // Missing on purpose: the sentinel check stays off unless a test sets one
    config.output.sentinel_path = root.join("error.jpg").display().to_string();
    config
}

fn no_probe() -> WalkOptions {
    WalkOptions {
        probe_total: false,
        ..WalkOptions::default()
    }
}

fn page_url(server: &MockServer, token: &str, index: u32) -> String {
    format!("{}/s/{}/{}-{}", server.uri(), token, BOOK, index)
}

/// Renders a page the way the origin does: loader script, then the image,
/// with `load_image` calls for the neighbouring pages
fn page_html(server: &MockServer, index: u32, next: Option<&str>, total: Option<u32>) -> String {
    let prev = if index > 1 {
        format!(
            r#"<a onclick="return load_image({}, 'prevtoken')" href="{}">&lt;</a>"#,
            index - 1,
            page_url(server, "prevtoken", index - 1)
        )
    } else {
        String::new()
    };
    let next = next
        .map(|token| {
            format!(
                r#"<a onclick="return load_image({}, '{}')" href="{}">&gt;</a>"#,
                index + 1,
                token,
                page_url(server, token, index + 1)
            )
        })
        .unwrap_or_default();
    let count = total
        .map(|total| format!("<div><span>{}</span> / <span>{}</span></div>", index, total))
        .unwrap_or_default();

    format!(
        r#"<html><head><title>{title}</title>
<script type="text/javascript" src="https://static.invalid/g/ehg.js"></script></head>
<body><div class="sn">{prev}{count}{next}</div>
<div id="i3"><script type="text/javascript" src="https://static.invalid/z/jads.js"></script>
<img id="img" src="{server}/img/{index}.jpg" style="width:1280px"></div>
</body></html>"#,
        title = TITLE,
        prev = prev,
        count = count,
        next = next,
        server = server.uri(),
        index = index,
    )
}

fn page_mock(token: &str, index: u32, body: impl Into<String>) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/s/{}/{}-{}", token, BOOK, index)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.into()))
}

fn image_mock(index: u32, bytes: &[u8]) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/img/{}.jpg", index)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.to_vec()))
}

fn image_bytes(index: u32) -> Vec<u8> {
    format!("jpeg-bytes-of-page-{}", index).into_bytes()
}

/// Mounts the standard three-page chain `t1 -> t2 -> t3` with its images
async fn mount_three_page_chain(server: &MockServer, total: Option<u32>) {
    page_mock("t1", 1, page_html(server, 1, Some("t2"), total))
        .mount(server)
        .await;
    page_mock("t2", 2, page_html(server, 2, Some("t3"), total))
        .mount(server)
        .await;
    page_mock("t3", 3, page_html(server, 3, None, total))
        .mount(server)
        .await;
    for index in 1..=3 {
        image_mock(index, &image_bytes(index))
            .expect(1)
            .mount(server)
            .await;
    }
}

fn book_dir(root: &Path) -> PathBuf {
    root.join(TITLE)
}

#[derive(Clone, Default)]
struct RecordingSink {
    calls: Arc<Mutex<Vec<(PathBuf, String)>>>,
}

impl CompletionSink for RecordingSink {
    fn on_complete(&self, folder: &Path, title: &str, _report: &TraversalReport) {
        self.calls
            .lock()
            .unwrap()
            .push((folder.to_path_buf(), title.to_string()));
    }
}

#[tokio::test]
async fn test_three_page_chain_completes() {
    let server = MockServer::start().await;
    mount_three_page_chain(&server, None).await;

    let root = TempDir::new().unwrap();
    let report = test_walker(root.path())
        .walk(&page_url(&server, "t1", 1), &no_probe())
        .await
        .unwrap();

    assert_eq!(report.state, TraversalState::Completed);
    assert_eq!(report.success_count, 3);
    assert_eq!(report.failed_count, 0);
    assert!(report.failed_page_urls.is_empty());
    assert_eq!(report.asset_fetches, 3);
    assert_eq!(report.total_pages_estimate, 3);
    assert_eq!(report.title.as_deref(), Some(TITLE));
    assert_eq!(report.folder.as_deref(), Some(book_dir(root.path()).as_path()));

    for index in 1..=3 {
        let file = book_dir(root.path()).join(format!("{}.jpg", index));
        assert_eq!(std::fs::read(&file).unwrap(), image_bytes(index));
    }
}

#[tokio::test]
async fn test_asset_requests_carry_origin_referer() {
    let server = MockServer::start().await;
    page_mock("t1", 1, page_html(&server, 1, None, None))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/1.jpg"))
        .and(header("referer", server.uri().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image_bytes(1)))
        .expect(1)
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let report = test_walker(root.path())
        .walk(&page_url(&server, "t1", 1), &no_probe())
        .await
        .unwrap();

    assert!(report.is_clean());
}

#[tokio::test]
async fn test_ban_on_second_page_aborts() {
    let server = MockServer::start().await;
    page_mock("t1", 1, page_html(&server, 1, Some("t2"), None))
        .mount(&server)
        .await;
    page_mock("t2", 2, BAN_PAGE).expect(1).mount(&server).await;
    page_mock("t3", 3, page_html(&server, 3, None, None))
        .expect(0)
        .mount(&server)
        .await;
    image_mock(1, &image_bytes(1)).expect(1).mount(&server).await;
    image_mock(2, &image_bytes(2)).expect(0).mount(&server).await;

    let root = TempDir::new().unwrap();
    let report = test_walker(root.path())
        .walk(&page_url(&server, "t1", 1), &no_probe())
        .await
        .unwrap();

    assert_eq!(
        report.state,
        TraversalState::Aborted(AbortReason::RateLimited)
    );
    assert_eq!(report.success_count, 1);
    assert!(book_dir(root.path()).join("1.jpg").exists());
    assert!(!book_dir(root.path()).join("2.jpg").exists());
}

#[tokio::test]
async fn test_sentinel_page_fails_then_recovers_on_retry() {
    let server = MockServer::start().await;
    page_mock("t1", 1, page_html(&server, 1, Some("t2"), None))
        .mount(&server)
        .await;
    page_mock("t2", 2, page_html(&server, 2, Some("t3"), None))
        .mount(&server)
        .await;
    page_mock("t3", 3, page_html(&server, 3, None, None))
        .mount(&server)
        .await;
    image_mock(1, &image_bytes(1)).expect(1).mount(&server).await;
    // First request for page 2 gets the placeholder, later ones the real image
    image_mock(2, SENTINEL).up_to_n_times(1).mount(&server).await;
    image_mock(2, &image_bytes(2)).mount(&server).await;
    image_mock(3, &image_bytes(3)).expect(1).mount(&server).await;

    let root = TempDir::new().unwrap();
    let walker = test_walker(root.path()).with_sentinel(Sentinel::from_bytes(SENTINEL));

    let report = walker
        .walk(&page_url(&server, "t1", 1), &no_probe())
        .await
        .unwrap();

    let failed_url = page_url(&server, "t2", 2);
    assert_eq!(report.state, TraversalState::Completed);
    assert_eq!(report.success_count, 2);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.failed_page_urls, vec![failed_url.clone()]);
    assert!(book_dir(root.path()).join("1.jpg").exists());
    assert!(!book_dir(root.path()).join("2.jpg").exists());
    assert!(book_dir(root.path()).join("3.jpg").exists());

    let retry = walker.retry_failed(&report.failed_page_urls, None, 1).await;

    assert_eq!(retry.recovered, vec![failed_url]);
    assert!(retry.still_failed.is_empty());
    assert!(!retry.rate_limited);
    assert_eq!(
        std::fs::read(book_dir(root.path()).join("2.jpg")).unwrap(),
        image_bytes(2)
    );
}

#[tokio::test]
async fn test_rerun_over_complete_folder_fetches_no_assets() {
    let server = MockServer::start().await;
    // Each image mock expects exactly one request across both runs
    mount_three_page_chain(&server, None).await;

    let root = TempDir::new().unwrap();
    let walker = test_walker(root.path());
    let url = page_url(&server, "t1", 1);

    let first = walker.walk(&url, &no_probe()).await.unwrap();
    assert_eq!(first.asset_fetches, 3);

    let second = walker.walk(&url, &no_probe()).await.unwrap();
    assert_eq!(second.state, TraversalState::Completed);
    assert_eq!(second.success_count, 3);
    assert_eq!(second.failed_count, 0);
    assert_eq!(second.asset_fetches, 0);
}

#[tokio::test]
async fn test_transient_timeout_is_retried() {
    let server = MockServer::start().await;
    // The first request for page 2 outlives the page timeout
    Mock::given(method("GET"))
        .and(path(format!("/s/t2/{}-2", BOOK)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page_html(&server, 2, Some("t3"), None))
                .set_delay(Duration::from_secs(2)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_three_page_chain(&server, None).await;

    let root = TempDir::new().unwrap();
    let report = test_walker(root.path())
        .walk(&page_url(&server, "t1", 1), &no_probe())
        .await
        .unwrap();

    assert_eq!(report.state, TraversalState::Completed);
    assert_eq!(report.success_count, 3);
    assert_eq!(report.failed_count, 0);
}

#[tokio::test]
async fn test_limited_retries_give_up() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .expect(2)
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let mut config = test_config(root.path());
    config.retry.max_attempts = 2;
    let walker = ChainWalker::new(&config).unwrap();

    let url = page_url(&server, "t1", 1);
    let report = walker.walk(&url, &no_probe()).await.unwrap();

    assert!(matches!(
        report.state,
        TraversalState::Truncated { page_index: 1, .. }
    ));
    assert_eq!(report.failed_page_urls, vec![url]);
}

#[tokio::test]
async fn test_http_error_truncates_chain() {
    let server = MockServer::start().await;
    page_mock("t1", 1, page_html(&server, 1, Some("t2"), None))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/s/t2/{}-2", BOOK)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    image_mock(1, &image_bytes(1)).mount(&server).await;

    let root = TempDir::new().unwrap();
    let report = test_walker(root.path())
        .walk(&page_url(&server, "t1", 1), &no_probe())
        .await
        .unwrap();

    assert_eq!(
        report.state,
        TraversalState::Truncated {
            page_index: 2,
            reason: "HTTP 500".to_string()
        }
    );
    assert_eq!(report.success_count, 1);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.failed_page_urls, vec![page_url(&server, "t2", 2)]);
}

#[tokio::test]
async fn test_missing_token_before_reported_end_truncates() {
    let server = MockServer::start().await;
    page_mock("t1", 1, page_html(&server, 1, Some("t2"), Some(5)))
        .mount(&server)
        .await;
    // Page 2 says there are 5 pages but offers no way forward
    page_mock("t2", 2, page_html(&server, 2, None, Some(5)))
        .mount(&server)
        .await;
    image_mock(1, &image_bytes(1)).mount(&server).await;
    image_mock(2, &image_bytes(2)).mount(&server).await;

    let root = TempDir::new().unwrap();
    let report = test_walker(root.path())
        .walk(&page_url(&server, "t1", 1), &no_probe())
        .await
        .unwrap();

    assert_eq!(
        report.state,
        TraversalState::Truncated {
            page_index: 2,
            reason: "next-hop token missing".to_string()
        }
    );
    assert_eq!(report.success_count, 2);
    assert_eq!(report.failed_count, 0);
}

#[tokio::test]
async fn test_page_without_image_is_failed_and_chain_continues() {
    let server = MockServer::start().await;
    page_mock("t1", 1, page_html(&server, 1, Some("t2"), None))
        .mount(&server)
        .await;
    // No loader script, so no image can be located
    page_mock(
        "t2",
        2,
        format!(
            "<html><title>{}</title><a onclick=\"return load_image(3, 't3')\">next</a></html>",
            TITLE
        ),
    )
    .mount(&server)
    .await;
    page_mock("t3", 3, page_html(&server, 3, None, None))
        .mount(&server)
        .await;
    image_mock(1, &image_bytes(1)).mount(&server).await;
    image_mock(3, &image_bytes(3)).mount(&server).await;

    let root = TempDir::new().unwrap();
    let report = test_walker(root.path())
        .walk(&page_url(&server, "t1", 1), &no_probe())
        .await
        .unwrap();

    assert_eq!(report.state, TraversalState::Completed);
    assert_eq!(report.success_count, 2);
    assert_eq!(report.failed_page_urls, vec![page_url(&server, "t2", 2)]);
}

#[tokio::test]
async fn test_write_failure_is_failed_and_chain_continues() {
    let server = MockServer::start().await;
    page_mock("t1", 1, page_html(&server, 1, Some("t2"), None))
        .mount(&server)
        .await;
    page_mock("t2", 2, page_html(&server, 2, Some("t3"), None))
        .mount(&server)
        .await;
    page_mock("t3", 3, page_html(&server, 3, None, None))
        .mount(&server)
        .await;
    for index in 1..=3 {
        image_mock(index, &image_bytes(index)).mount(&server).await;
    }

    // A directory where page 2's temporary file goes makes its write fail
    let root = TempDir::new().unwrap();
    let blocked = book_dir(root.path()).join("2.jpg.part");
    std::fs::create_dir_all(&blocked).unwrap();

    let report = test_walker(root.path())
        .walk(&page_url(&server, "t1", 1), &no_probe())
        .await
        .unwrap();

    assert_eq!(report.state, TraversalState::Completed);
    assert_eq!(report.success_count, 2);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.failed_page_urls, vec![page_url(&server, "t2", 2)]);
    assert_eq!(report.asset_fetches, 3);
    assert!(book_dir(root.path()).join("1.jpg").exists());
    assert!(!book_dir(root.path()).join("2.jpg").exists());
    assert_eq!(
        std::fs::read(book_dir(root.path()).join("3.jpg")).unwrap(),
        image_bytes(3)
    );
    assert!(blocked.is_dir());
}

#[tokio::test]
async fn test_probe_total_and_progress_events() {
    let server = MockServer::start().await;
    mount_three_page_chain(&server, Some(3)).await;

    let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::default();
    let recorded = Arc::clone(&events);

    let root = TempDir::new().unwrap();
    let report = test_walker(root.path())
        .with_observer(move |event: &ProgressEvent| recorded.lock().unwrap().push(event.clone()))
        .walk(&page_url(&server, "t1", 1), &WalkOptions::default())
        .await
        .unwrap();

    assert_eq!(report.state, TraversalState::Completed);
    assert_eq!(report.total_pages_estimate, 3);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0].status, "Counting total pages...");
    assert!(events[0].success_count.is_none());

    let percents: Vec<f64> = events[1..].iter().map(|e| e.percent.round()).collect();
    assert_eq!(percents, vec![33.0, 67.0, 100.0]);
    assert_eq!(events[3].success_count, Some(3));
    assert_eq!(events[3].total_estimate, Some(3));
}

#[tokio::test]
async fn test_count_pages_walks_chain_without_hint() {
    let server = MockServer::start().await;
    page_mock("t1", 1, page_html(&server, 1, Some("t2"), None))
        .mount(&server)
        .await;
    page_mock("t2", 2, page_html(&server, 2, Some("t3"), None))
        .mount(&server)
        .await;
    page_mock("t3", 3, page_html(&server, 3, None, None))
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let total = test_walker(root.path())
        .count_pages(&page_url(&server, "t1", 1))
        .await
        .unwrap();

    assert_eq!(total, 3);
}

#[tokio::test]
async fn test_completion_sink_notified_once() {
    let server = MockServer::start().await;
    mount_three_page_chain(&server, None).await;

    let sink = RecordingSink::default();
    let root = TempDir::new().unwrap();
    test_walker(root.path())
        .with_completion_sink(sink.clone())
        .walk(&page_url(&server, "t1", 1), &no_probe())
        .await
        .unwrap();

    let calls = sink.calls.lock().unwrap();
    assert_eq!(*calls, vec![(book_dir(root.path()), TITLE.to_string())]);
}

#[tokio::test]
async fn test_completion_sink_not_notified_on_abort() {
    let server = MockServer::start().await;
    page_mock("t1", 1, BAN_PAGE).mount(&server).await;

    let sink = RecordingSink::default();
    let root = TempDir::new().unwrap();
    let report = test_walker(root.path())
        .with_completion_sink(sink.clone())
        .walk(&page_url(&server, "t1", 1), &no_probe())
        .await
        .unwrap();

    assert!(report.state.is_rate_limited());
    assert!(sink.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_title_remap_and_folder_override() {
    let server = MockServer::start().await;
    page_mock("t1", 1, page_html(&server, 1, None, None))
        .mount(&server)
        .await;
    image_mock(1, &image_bytes(1)).mount(&server).await;

    let root = TempDir::new().unwrap();
    let mut config = test_config(root.path());
    config
        .titles
        .insert(TITLE.to_string(), "Remapped".to_string());
    let walker = ChainWalker::new(&config).unwrap();
    let url = page_url(&server, "t1", 1);

    let report = walker.walk(&url, &no_probe()).await.unwrap();
    assert_eq!(report.title.as_deref(), Some("Remapped"));
    assert!(root.path().join("Remapped").join("1.jpg").exists());

    let options = WalkOptions {
        folder_name: Some("Chosen".to_string()),
        ..no_probe()
    };
    let report = walker.walk(&url, &options).await.unwrap();
    assert_eq!(report.title.as_deref(), Some("Chosen"));
    assert!(root.path().join("Chosen").join("1.jpg").exists());
}

#[tokio::test]
async fn test_single_page_mode_does_not_follow_chain() {
    let server = MockServer::start().await;
    page_mock("t1", 1, page_html(&server, 1, Some("t2"), None))
        .mount(&server)
        .await;
    page_mock("t2", 2, page_html(&server, 2, None, None))
        .expect(0)
        .mount(&server)
        .await;
    image_mock(1, &image_bytes(1)).mount(&server).await;

    let options = WalkOptions {
        single_page_only: true,
        ..WalkOptions::default()
    };

    let root = TempDir::new().unwrap();
    let report = test_walker(root.path())
        .walk(&page_url(&server, "t1", 1), &options)
        .await
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.total_pages_estimate, 1);
    assert_eq!(report.success_count, 1);
}

#[tokio::test]
async fn test_batch_retry_stops_on_rate_limit() {
    let server = MockServer::start().await;
    page_mock("a", 4, BAN_PAGE).expect(1).mount(&server).await;
    page_mock("b", 7, page_html(&server, 7, None, None))
        .expect(0)
        .mount(&server)
        .await;
    page_mock("c", 9, page_html(&server, 9, None, None))
        .expect(0)
        .mount(&server)
        .await;

    let urls = vec![
        page_url(&server, "a", 4),
        page_url(&server, "b", 7),
        page_url(&server, "c", 9),
    ];

    let root = TempDir::new().unwrap();
    let retry = test_walker(root.path()).retry_failed(&urls, None, 1).await;

    assert!(retry.rate_limited);
    assert!(retry.recovered.is_empty());
    assert_eq!(retry.still_failed, urls);
}

#[tokio::test]
async fn test_batch_retry_dedups_and_keeps_order() {
    let server = MockServer::start().await;
    page_mock("a", 2, page_html(&server, 2, None, None))
        .expect(1)
        .mount(&server)
        .await;
    page_mock("b", 5, page_html(&server, 5, None, None))
        .expect(1)
        .mount(&server)
        .await;
    image_mock(2, &image_bytes(2)).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/img/5.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let a = page_url(&server, "a", 2);
    let b = page_url(&server, "b", 5);
    let urls = vec![b.clone(), a.clone(), b.clone()];

    let root = TempDir::new().unwrap();
    let retry = test_walker(root.path()).retry_failed(&urls, None, 4).await;

    assert_eq!(retry.recovered, vec![a]);
    assert_eq!(retry.still_failed, vec![b]);
    assert!(!retry.rate_limited);
}

#[tokio::test]
async fn test_cancel_before_start() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let root = TempDir::new().unwrap();
    let report = test_walker(root.path())
        .with_cancellation(cancel)
        .walk(&page_url(&server, "t1", 1), &WalkOptions::default())
        .await
        .unwrap();

    assert_eq!(report.state, TraversalState::Cancelled);
    assert_eq!(report.attempted(), 0);
}

#[tokio::test]
async fn test_cancel_interrupts_endless_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let root = TempDir::new().unwrap();
    let walker = test_walker(root.path()).with_cancellation(cancel.clone());

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1_200)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(
        Duration::from_secs(10),
        walker.walk(&page_url(&server, "t1", 1), &no_probe()),
    )
    .await
    .expect("walk did not stop after cancellation")
    .unwrap();

    assert_eq!(report.state, TraversalState::Cancelled);
    assert_eq!(report.failed_count, 0);
}

#[tokio::test]
async fn test_dom_parser_walks_same_chain() {
    let server = MockServer::start().await;
    mount_three_page_chain(&server, None).await;

    let root = TempDir::new().unwrap();
    let report = test_walker(root.path())
        .with_parser(parser_for(ParserKind::Dom))
        .walk(&page_url(&server, "t1", 1), &no_probe())
        .await
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.success_count, 3);
}

#[tokio::test]
async fn test_invalid_start_url_is_rejected() {
    let root = TempDir::new().unwrap();
    let result = test_walker(root.path())
        .walk("https://example.org/g/555/abcdef/", &WalkOptions::default())
        .await;

    assert!(matches!(result, Err(pagechain::ChainError::Url(_))));
}

#[tokio::test]
async fn test_start_index_without_successor_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BAN_PAGE))
        .expect(0)
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let walker = test_walker(root.path());
    let url = page_url(&server, "t1", u32::MAX);

    let walked = walker.walk(&url, &WalkOptions::default()).await;
    assert!(matches!(
        walked,
        Err(pagechain::ChainError::Url(pagechain::UrlError::InvalidPageIndex(_)))
    ));

    let single = walker.walk_single(&url, None).await;
    assert!(matches!(single, Err(pagechain::ChainError::Url(_))));

    let counted = walker.count_pages(&url).await;
    assert!(matches!(counted, Err(pagechain::ChainError::Url(_))));
}
