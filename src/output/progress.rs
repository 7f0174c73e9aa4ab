//! Progress events emitted while a traversal runs

/// One progress update
///
/// Counters are optional: intermediate updates (e.g. "Counting total
/// pages...") carry only a status line.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Completion percentage in `[0, 100]`
    pub percent: f64,

    /// Human-readable status line
    pub status: String,

    /// Pages saved or already present so far
    pub success_count: Option<u32>,

    /// Pages failed so far
    pub failed_count: Option<u32>,

    /// Current estimate of the total page count
    pub total_estimate: Option<u32>,
}

impl ProgressEvent {
    /// An update that only carries a status line
    pub fn status(percent: f64, status: impl Into<String>) -> Self {
        Self {
            percent: percent.clamp(0.0, 100.0),
            status: status.into(),
            success_count: None,
            failed_count: None,
            total_estimate: None,
        }
    }

    /// An update carrying the full set of counters
    pub fn with_counts(
        percent: f64,
        status: impl Into<String>,
        success_count: u32,
        failed_count: u32,
        total_estimate: u32,
    ) -> Self {
        Self {
            percent: percent.clamp(0.0, 100.0),
            status: status.into(),
            success_count: Some(success_count),
            failed_count: Some(failed_count),
            total_estimate: Some(total_estimate),
        }
    }
}

/// Receives progress updates from the walker
pub trait ProgressObserver: Send + Sync {
    /// Called after each traversal step
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Observer that forwards progress to the tracing subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_progress(&self, event: &ProgressEvent) {
        match (event.success_count, event.failed_count, event.total_estimate) {
            (Some(ok), Some(failed), Some(total)) => tracing::info!(
                "[{:5.1}%] {} (ok: {}, failed: {}, total: {})",
                event.percent,
                event.status,
                ok,
                failed,
                total
            ),
            _ => tracing::info!("[{:5.1}%] {}", event.percent, event.status),
        }
    }
}

/// Percentage of the chain covered when standing on `current`
///
/// The total is an estimate and may undercount, so the result is clamped.
/// An unknown total (0) reports 0%.
pub fn percent_done(current: u32, start: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let done = current.saturating_sub(start) as f64;
    (done / total as f64 * 100.0).clamp(0.0, 100.0)
}
