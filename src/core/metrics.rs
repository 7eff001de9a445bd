//! Pipeline metrics for observability
//!
//! Counters for lines written, sink failures and the life cycle of
//! notifications handed to the delivery worker.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for pipeline observability
///
/// # Example
///
/// ```
/// use rust_context_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_written();
/// metrics.record_notification_enqueued();
/// metrics.record_notification_failed();
///
/// assert_eq!(metrics.lines_written(), 1);
/// assert_eq!(metrics.notification_failure_rate(), 100.0);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Lines the sink accepted
    lines_written: AtomicU64,

    /// Lines the sink rejected or panicked on
    sink_failures: AtomicU64,

    /// Notifications accepted by the delivery queue
    notifications_enqueued: AtomicU64,

    /// Notifications the transport delivered
    notifications_delivered: AtomicU64,

    /// Notifications the transport failed to deliver
    notifications_failed: AtomicU64,

    /// Notifications discarded at shutdown or after the worker stopped
    notifications_dropped: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            lines_written: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            notifications_enqueued: AtomicU64::new(0),
            notifications_delivered: AtomicU64::new(0),
            notifications_failed: AtomicU64::new(0),
            notifications_dropped: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn lines_written(&self) -> u64 {
        self.lines_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn notifications_enqueued(&self) -> u64 {
        self.notifications_enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn notifications_delivered(&self) -> u64 {
        self.notifications_delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn notifications_failed(&self) -> u64 {
        self.notifications_failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn notifications_dropped(&self) -> u64 {
        self.notifications_dropped.load(Ordering::Relaxed)
    }

    /// Record a written line, returning the previous count
    #[inline]
    pub fn record_written(&self) -> u64 {
        self.lines_written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_failure(&self) -> u64 {
        self.sink_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_notification_enqueued(&self) -> u64 {
        self.notifications_enqueued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_notification_delivered(&self) -> u64 {
        self.notifications_delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_notification_failed(&self) -> u64 {
        self.notifications_failed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_notification_dropped(&self) -> u64 {
        self.notifications_dropped.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of attempted deliveries that failed, as a percentage
    ///
    /// Returns 0.0 if nothing has been attempted yet.
    pub fn notification_failure_rate(&self) -> f64 {
        let failed = self.notifications_failed() as f64;
        let attempted = self.notifications_delivered() as f64 + failed;
        if attempted == 0.0 {
            0.0
        } else {
            (failed / attempted) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.lines_written.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
        self.notifications_enqueued.store(0, Ordering::Relaxed);
        self.notifications_delivered.store(0, Ordering::Relaxed);
        self.notifications_failed.store(0, Ordering::Relaxed);
        self.notifications_dropped.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            lines_written: AtomicU64::new(self.lines_written()),
            sink_failures: AtomicU64::new(self.sink_failures()),
            notifications_enqueued: AtomicU64::new(self.notifications_enqueued()),
            notifications_delivered: AtomicU64::new(self.notifications_delivered()),
            notifications_failed: AtomicU64::new(self.notifications_failed()),
            notifications_dropped: AtomicU64::new(self.notifications_dropped()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.lines_written(), 0);
        assert_eq!(metrics.sink_failures(), 0);
        assert_eq!(metrics.notifications_enqueued(), 0);
        assert_eq!(metrics.notifications_delivered(), 0);
        assert_eq!(metrics.notifications_failed(), 0);
        assert_eq!(metrics.notifications_dropped(), 0);
    }

    #[test]
    fn test_record_returns_previous() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.record_written(), 0);
        assert_eq!(metrics.record_written(), 1);
        assert_eq!(metrics.lines_written(), 2);
    }

    #[test]
    fn test_failure_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.notification_failure_rate(), 0.0);

        for _ in 0..9 {
            metrics.record_notification_delivered();
        }
        metrics.record_notification_failed();

        let rate = metrics.notification_failure_rate();
        assert!((9.9..=10.1).contains(&rate), "Failure rate was {}", rate);
    }

    #[test]
    fn test_reset() {
        let metrics = LoggerMetrics::new();
        metrics.record_written();
        metrics.record_sink_failure();
        metrics.record_notification_dropped();

        metrics.reset();

        assert_eq!(metrics.lines_written(), 0);
        assert_eq!(metrics.sink_failures(), 0);
        assert_eq!(metrics.notifications_dropped(), 0);
    }

    #[test]
    fn test_clone_is_snapshot() {
        let metrics = LoggerMetrics::new();
        metrics.record_written();

        let snapshot = metrics.clone();
        metrics.record_written();

        assert_eq!(metrics.lines_written(), 2);
        assert_eq!(snapshot.lines_written(), 1);
    }
}
