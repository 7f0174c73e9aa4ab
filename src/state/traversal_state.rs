/// Traversal state definitions for tracking a chain walk
///
/// This module defines every state a traversal can be in, from the optional
/// counting pass to its terminal outcome.
use std::fmt;

/// Why a traversal was aborted before reaching the end of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortReason {
    /// The origin answered with its "temporarily banned" page
    RateLimited,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
        }
    }
}

/// Represents the current state of a traversal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TraversalState {
    // ===== Active States =====
    /// Probing the chain for a total page count
    Counting,

    /// Walking the chain page by page
    Traversing,

    // ===== Terminal Success States =====
    /// The last page carried no next-hop token
    Completed,

    // ===== Terminal Error States =====
    /// Stopped early; later pages were not attempted
    Aborted(AbortReason),

    /// The chain could not be followed past `page_index`
    Truncated {
        /// Last page that was attempted
        page_index: u32,
        /// Human-readable cause
        reason: String,
    },

    /// The caller cancelled the traversal
    Cancelled,
}

impl TraversalState {
    /// Returns true if this is a terminal state (the traversal is over)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if the traversal may still make progress
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Counting | Self::Traversing)
    }

    /// Returns true if the whole chain was walked
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if the origin rate limited this run
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Aborted(AbortReason::RateLimited))
    }

    /// Short machine-readable name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counting => "counting",
            Self::Traversing => "traversing",
            Self::Completed => "completed",
            Self::Aborted(_) => "aborted",
            Self::Truncated { .. } => "truncated",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TraversalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted(reason) => write!(f, "aborted ({})", reason),
            Self::Truncated { page_index, reason } => {
                write!(f, "truncated at page {} ({})", page_index, reason)
            }
            other => write!(f, "{}", other.as_str()),
        }
    }
}
