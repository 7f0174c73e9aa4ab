//! Human-readable traversal summaries

use crate::crawler::RetryReport;
use crate::state::TraversalReport;
use std::io::Write;
use std::path::Path;

/// Success rate in percent over attempted pages
pub fn success_rate(report: &TraversalReport) -> f64 {
    let attempted = report.attempted();
    if attempted == 0 {
        return 0.0;
    }
    report.success_count as f64 / attempted as f64 * 100.0
}

/// Prints a traversal report to stdout in a formatted manner
pub fn print_report(report: &TraversalReport) {
    println!("=== Traversal Report ===\n");

    println!("Outcome: {}", report.state);
    if let Some(title) = &report.title {
        println!("Title: {}", title);
    }
    if let Some(folder) = &report.folder {
        println!("Folder: {}", folder.display());
    }
    println!();

    println!("Pages:");
    println!("  Estimated total: {}", report.total_pages_estimate);
    println!("  Succeeded: {}", report.success_count);
    println!("  Failed: {}", report.failed_count);
    println!("  Asset downloads: {}", report.asset_fetches);
    println!();

    if !report.failed_page_urls.is_empty() {
        println!("Failed URLs ({}):", report.failed_page_urls.len());
        for url in &report.failed_page_urls {
            println!("  - {}", url);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages)",
        success_rate(report),
        report.success_count,
        report.attempted()
    );
}

/// Prints a batch retry summary to stdout
pub fn print_retry_report(report: &RetryReport) {
    println!("=== Retry Report ===\n");
    println!("Recovered: {}", report.recovered.len());
    println!("Still failing: {}", report.still_failed.len());
    if report.rate_limited {
        println!("Stopped early: rate limited by the origin");
    }
    for url in &report.still_failed {
        println!("  - {}", url);
    }
}

/// Writes failed URLs to `path`, one per line
///
/// An empty list removes a stale file instead of leaving an empty one.
pub fn write_failed_urls(path: &Path, urls: &[String]) -> std::io::Result<()> {
    if urls.is_empty() {
        return match std::fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        };
    }

    let mut file = std::fs::File::create(path)?;
    for url in urls {
        writeln!(file, "{}", url)?;
    }
    Ok(())
}

/// Reads a failed-URL list written by [`write_failed_urls`]
///
/// Blank lines and `#` comments are skipped.
pub fn read_failed_urls(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
