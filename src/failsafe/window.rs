//! Sliding failure window

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Rolling count of recent failure timestamps.
///
/// Records are pruned lazily on each [`count`](Self::count): entries strictly
/// older than the window are discarded, so storage never grows past the
/// failures seen within one window span.
pub struct FailureWindow {
    /// Window span
    window: Duration,
    /// Failure timestamps, ascending
    records: Mutex<Vec<Instant>>,
}

impl FailureWindow {
    /// Create an empty window
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Record one failure at `now`
    pub fn record(&self, now: Instant) {
        self.records.lock().push(now);
    }

    /// Clear all records
    pub fn reset(&self) {
        self.records.lock().clear();
    }

    /// Count failures within the window ending at `now`, pruning older entries
    pub fn count(&self, now: Instant) -> usize {
        let mut records = self.records.lock();
        if let Some(cutoff) = now.checked_sub(self.window) {
            // Timestamps are appended in order, so everything before the
            // partition point is stale.
            let stale = records.partition_point(|&t| t < cutoff);
            records.drain(..stale);
        }
        records.len()
    }
}
