//! Output module for progress, completion and summaries
//!
//! This module handles:
//! - Progress events and observers
//! - Completion notification for downstream document assembly
//! - Listing the numbered images in a folder
//! - Printing reports and persisting failed-URL lists

pub mod manifest;
mod progress;
mod sink;
pub mod stats;

pub use manifest::{collect_page_images, sanitize_folder_name, ImageManifest};
pub use progress::{percent_done, ProgressEvent, ProgressObserver, TracingObserver};
pub use sink::{CompletionSink, ManifestLogger};
pub use stats::{print_report, print_retry_report, read_failed_urls, write_failed_urls};
