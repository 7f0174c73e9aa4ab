//! Image manifest for a downloaded folder
//!
//! The folder of numbered images is the artifact downstream document
//! assembly consumes. This module lists those images in page order.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Ordered list of page images in a folder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageManifest {
    /// Image files in page order
    pub images: Vec<PathBuf>,

    /// Sum of the image file sizes in bytes
    pub total_bytes: u64,
}

impl ImageManifest {
    /// Number of images listed
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Returns true if no images were found
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Total size in mebibytes, rounded to two decimals
    pub fn total_mib(&self) -> f64 {
        (self.total_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
    }
}

/// Lists the page images in `dir` in natural page order
///
/// Extensions are matched case-insensitively and `extensions` doubles as a
/// preference order: when `3.jpg` and `3.webp` both exist, the one whose
/// extension comes first wins. Files with non-numeric stems sort after the
/// numbered pages using natural ordering.
pub fn collect_page_images(dir: &Path, extensions: &[String]) -> std::io::Result<ImageManifest> {
    let wanted: Vec<String> = extensions.iter().map(|e| e.to_ascii_lowercase()).collect();

    // stem -> (preference rank, path, size)
    let mut by_stem: BTreeMap<String, (usize, PathBuf, u64)> = BTreeMap::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() {
            continue;
        }

        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let Some(rank) = wanted.iter().position(|w| *w == ext.to_ascii_lowercase()) else {
            continue;
        };
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };

        let size = entry.metadata()?.len();
        match by_stem.get(&stem) {
            Some((existing_rank, _, _)) if *existing_rank <= rank => {}
            _ => {
                by_stem.insert(stem, (rank, path, size));
            }
        }
    }

    let mut entries: Vec<(String, PathBuf, u64)> = by_stem
        .into_iter()
        .map(|(stem, (_, path, size))| (stem, path, size))
        .collect();
    entries.sort_by(|a, b| natural_cmp(&a.0, &b.0));

    Ok(ImageManifest {
        total_bytes: entries.iter().map(|(_, _, size)| size).sum(),
        images: entries.into_iter().map(|(_, path, _)| path).collect(),
    })
}

/// Compares strings treating digit runs as numbers (`2` < `10`)
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a_parts = split_digit_runs(a);
    let b_parts = split_digit_runs(b);

    for (x, y) in a_parts.iter().zip(b_parts.iter()) {
        let ordering = match (x.parse::<u64>(), y.parse::<u64>()) {
            (Ok(nx), Ok(ny)) => nx.cmp(&ny),
            // Numbers sort before text
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => x.to_lowercase().cmp(&y.to_lowercase()),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    a_parts.len().cmp(&b_parts.len())
}

fn split_digit_runs(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;

    for c in s.chars() {
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != in_digits {
            parts.push(std::mem::take(&mut current));
        }
        in_digits = is_digit;
        current.push(c);
    }
    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

/// Makes a page title safe to use as a single directory name
///
/// Path separators and characters rejected by common filesystems become `_`,
/// surrounding whitespace and trailing dots are removed. An empty result
/// falls back to `"Unknown"`.
pub fn sanitize_folder_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let cleaned = cleaned.trim().trim_end_matches('.').trim();
    if cleaned.is_empty() || cleaned == ".." {
        crate::crawler::UNKNOWN_TITLE.to_string()
    } else {
        cleaned.to_string()
    }
}
