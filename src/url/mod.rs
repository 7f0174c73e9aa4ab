//! URL handling module for Pagechain
//!
//! This module provides the page URL grammar: splitting a starting URL into
//! its origin and [`PageIdentity`], and rebuilding page URLs as the chain is
//! walked.

mod page;

// Re-export main types and functions
pub use page::{build_page_url, parse_page_url, PageAddress, PageIdentity, MAX_PAGE_INDEX};
