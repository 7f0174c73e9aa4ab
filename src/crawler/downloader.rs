//! Asset downloader
//!
//! Downloads the image for one page and persists it as `<pageIndex>.jpg`.
//!
//! # Guarantees
//!
//! - A page whose file already exists is never fetched again, which makes
//!   repeated runs over the same work cheap and safe to interrupt.
//! - A payload identical to the "blocked" sentinel image is never written.
//! - A file only appears under its final name once fully written.

use crate::crawler::fetcher::PageFetcher;
use crate::ChainError;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Known placeholder image served instead of the real asset when access is blocked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentinel {
    bytes: Vec<u8>,
}

impl Sentinel {
    /// A sentinel that matches nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a sentinel from raw bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Loads the sentinel image from disk
    ///
    /// A missing file disables the check with a warning. Any other read error
    /// is returned.
    pub fn load(path: &Path) -> Result<Self, ChainError> {
        match std::fs::read(path) {
            Ok(bytes) => {
                let sentinel = Self::from_bytes(bytes);
                tracing::info!(
                    "Loaded sentinel image {} ({} bytes, sha256 {})",
                    path.display(),
                    sentinel.bytes.len(),
                    sentinel.fingerprint().unwrap_or_default()
                );
                Ok(sentinel)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    "Sentinel image {} not found, blocked-image detection disabled",
                    path.display()
                );
                Ok(Self::empty())
            }
            Err(source) => Err(ChainError::Sentinel {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Returns true if the check is active
    pub fn is_enabled(&self) -> bool {
        !self.bytes.is_empty()
    }

    /// Returns true if `payload` is byte-for-byte the sentinel
    pub fn matches(&self, payload: &[u8]) -> bool {
        self.is_enabled() && self.bytes == payload
    }

    /// Hex SHA-256 of the sentinel bytes, if enabled
    pub fn fingerprint(&self) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        Some(hex::encode(Sha256::digest(&self.bytes)))
    }
}

/// Outcome of downloading one page's asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Fetched and written
    Saved,

    /// The file already existed; nothing was fetched
    AlreadyPresent,

    /// The payload was the blocked placeholder; nothing was written
    RejectedAsSentinel,

    /// The fetch failed or returned an unusable payload
    TransportError(String),

    /// The payload could not be written to disk
    StorageError(String),
}

impl DownloadOutcome {
    /// Returns true if the page image is on disk
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Saved | Self::AlreadyPresent)
    }

    /// Returns true if producing this outcome required a network request
    pub fn used_network(&self) -> bool {
        !matches!(self, Self::AlreadyPresent)
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved => write!(f, "saved"),
            Self::AlreadyPresent => write!(f, "already present"),
            Self::RejectedAsSentinel => write!(f, "rejected: blocked placeholder image"),
            Self::TransportError(detail) => write!(f, "transport error: {}", detail),
            Self::StorageError(detail) => write!(f, "storage error: {}", detail),
        }
    }
}

/// Path of the image file for a page
pub fn page_image_path(dest_dir: &Path, page_index: u32) -> PathBuf {
    dest_dir.join(format!("{}.jpg", page_index))
}

/// Downloads page assets into a destination folder
#[derive(Debug, Clone)]
pub struct AssetDownloader {
    fetcher: Arc<PageFetcher>,
    sentinel: Arc<Sentinel>,
}

impl AssetDownloader {
    /// Creates a downloader sharing the given fetcher and sentinel
    pub fn new(fetcher: Arc<PageFetcher>, sentinel: Arc<Sentinel>) -> Self {
        Self { fetcher, sentinel }
    }

    /// Returns true if the page image already exists on disk
    pub async fn is_present(&self, dest_dir: &Path, page_index: u32) -> bool {
        tokio::fs::metadata(page_image_path(dest_dir, page_index))
            .await
            .is_ok()
    }

    /// Downloads one page's asset into `dest_dir/<page_index>.jpg`
    ///
    /// # Flow
    ///
    /// 1. If the target file exists → `AlreadyPresent`, no request is made
    /// 2. GET the asset with `Referer: referer`
    /// 3. Empty payload → `TransportError`; sentinel payload → `RejectedAsSentinel`
    /// 4. Create `dest_dir` if needed and write through a temporary file
    pub async fn download_asset(
        &self,
        asset_url: &str,
        referer: &str,
        dest_dir: &Path,
        page_index: u32,
    ) -> DownloadOutcome {
        let target = page_image_path(dest_dir, page_index);

        if self.is_present(dest_dir, page_index).await {
            tracing::debug!("Image {} already exists, skipping", target.display());
            return DownloadOutcome::AlreadyPresent;
        }

        let bytes = match self.fetcher.fetch_asset(asset_url, referer).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to download image for page {}: {}", page_index, e);
                return DownloadOutcome::TransportError(e.to_string());
            }
        };

        if bytes.is_empty() {
            return DownloadOutcome::TransportError("empty response body".to_string());
        }

        if self.sentinel.matches(&bytes) {
            tracing::warn!(
                "Downloaded image for page {} is the blocked placeholder, not saving",
                page_index
            );
            return DownloadOutcome::RejectedAsSentinel;
        }

        if let Err(e) = tokio::fs::create_dir_all(dest_dir).await {
            return DownloadOutcome::StorageError(format!(
                "failed to create {}: {}",
                dest_dir.display(),
                e
            ));
        }

        match write_atomically(&target, &bytes).await {
            Ok(()) => {
                tracing::debug!("Saved page {} to {}", page_index, target.display());
                DownloadOutcome::Saved
            }
            Err(e) => DownloadOutcome::StorageError(format!(
                "failed to write {}: {}",
                target.display(),
                e
            )),
        }
    }
}

/// Writes `bytes` to a temporary sibling of `target`, then renames it into place
///
/// On failure the temporary file is removed and `target` is left untouched.
async fn write_atomically(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let temp = target.with_extension("jpg.part");

    let result = async {
        let mut file = tokio::fs::File::create(&temp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp, target).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&temp).await;
    }

    result
}
