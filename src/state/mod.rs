//! State module for tracking traversal progress
//!
//! # Components
//!
//! - `TraversalState`: where a chain walk is (counting, traversing, or one of its terminal outcomes)
//! - `TraversalReport`: per-run success/failure bookkeeping returned to the caller

mod report;
mod traversal_state;

// Re-export main types
pub use report::TraversalReport;
pub use traversal_state::{AbortReason, TraversalState};
