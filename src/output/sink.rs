//! Completion notification for document assembly
//!
//! When a traversal completes, the walker hands the folder of numbered
//! images to a [`CompletionSink`]. Building the final document is the sink's
//! business; the walker only guarantees the images exist and are not the
//! blocked placeholder.

use crate::output::manifest::collect_page_images;
use crate::state::TraversalReport;
use std::path::Path;

/// Receives the finished image folder
pub trait CompletionSink: Send + Sync {
    /// Called once per completed traversal
    fn on_complete(&self, folder: &Path, title: &str, report: &TraversalReport);
}

/// Sink that lists the folder and logs what an assembler would receive
#[derive(Debug, Clone)]
pub struct ManifestLogger {
    extensions: Vec<String>,
}

impl ManifestLogger {
    /// Creates a logger matching the given image extensions
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }
}

impl CompletionSink for ManifestLogger {
    fn on_complete(&self, folder: &Path, title: &str, report: &TraversalReport) {
        match collect_page_images(folder, &self.extensions) {
            Ok(manifest) => tracing::info!(
                "'{}' ready for assembly: {} images ({} MiB) in {} ({} failed pages)",
                title,
                manifest.len(),
                manifest.total_mib(),
                folder.display(),
                report.failed_page_urls.len()
            ),
            Err(e) => tracing::warn!("Could not list images in {}: {}", folder.display(), e),
        }
    }
}
