//! Logger metrics for observability
//!
//! Counters shared by the manager and every destination writer it creates.
//! Drops never surface as errors to emitters, so these counters are the only
//! place where filtered or overflowing messages become visible.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use rust_module_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_enqueued();
/// metrics.record_written(1);
/// metrics.record_filtered();
///
/// assert_eq!(metrics.enqueued(), 1);
/// assert_eq!(metrics.written(), 1);
/// assert_eq!(metrics.dropped_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Messages handed to a destination writer's queue
    enqueued: AtomicU64,

    /// Messages parked in the pre-registration backlog
    backlogged: AtomicU64,

    /// Backlogged messages replayed into a writer
    replayed: AtomicU64,

    /// Messages dropped by level, pause or disabled mode
    filtered: AtomicU64,

    /// Messages dropped because a module's backlog was full
    backlog_dropped: AtomicU64,

    /// Lines persisted by workers (file or console)
    written: AtomicU64,

    /// Lines lost to I/O failures in workers
    write_failures: AtomicU64,

    /// Size-triggered file rotations
    rotations: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            backlogged: AtomicU64::new(0),
            replayed: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            backlog_dropped: AtomicU64::new(0),
            written: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn backlogged(&self) -> u64 {
        self.backlogged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn replayed(&self) -> u64 {
        self.replayed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn backlog_dropped(&self) -> u64 {
        self.backlog_dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    /// Every message that will never be persisted, whatever the reason
    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.filtered() + self.backlog_dropped() + self.write_failures()
    }

    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_backlogged(&self) -> u64 {
        self.backlogged.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_replayed(&self) -> u64 {
        self.replayed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_backlog_dropped(&self) -> u64 {
        self.backlog_dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_written(&self, lines: u64) -> u64 {
        self.written.fetch_add(lines, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_failures(&self, lines: u64) -> u64 {
        self.write_failures.fetch_add(lines, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rotation(&self) -> u64 {
        self.rotations.fetch_add(1, Ordering::Relaxed)
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been logged or dropped yet.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.enqueued() as f64 + self.filtered() as f64 + self.backlog_dropped() as f64;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.enqueued.store(0, Ordering::Relaxed);
        self.backlogged.store(0, Ordering::Relaxed);
        self.replayed.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.backlog_dropped.store(0, Ordering::Relaxed);
        self.written.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
        self.rotations.store(0, Ordering::Relaxed);
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
            enqueued: AtomicU64::new(self.enqueued()),
            backlogged: AtomicU64::new(self.backlogged()),
            replayed: AtomicU64::new(self.replayed()),
            filtered: AtomicU64::new(self.filtered()),
            backlog_dropped: AtomicU64::new(self.backlog_dropped()),
            written: AtomicU64::new(self.written()),
            write_failures: AtomicU64::new(self.write_failures()),
            rotations: AtomicU64::new(self.rotations()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.enqueued(), 0);
        assert_eq!(metrics.written(), 0);
        assert_eq!(metrics.dropped_count(), 0);
        assert_eq!(metrics.rotations(), 0);
    }

    #[test]
    fn test_record_returns_previous_value() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.record_backlogged(), 0);
        assert_eq!(metrics.record_backlogged(), 1);
        assert_eq!(metrics.backlogged(), 2);
    }

    #[test]
    fn test_dropped_count_sums_all_losses() {
        let metrics = LoggerMetrics::new();
        metrics.record_filtered();
        metrics.record_backlog_dropped();
        metrics.record_write_failures(3);
        assert_eq!(metrics.dropped_count(), 5);
    }

    #[test]
    fn test_metrics_drop_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.drop_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_enqueued();
        }
        for _ in 0..10 {
            metrics.record_filtered();
        }

        let rate = metrics.drop_rate();
        assert!((9.9..=10.1).contains(&rate), "Drop rate was {}", rate);
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = LoggerMetrics::new();
        metrics.record_enqueued();
        metrics.record_rotation();
        metrics.record_written(4);

        metrics.reset();

        assert_eq!(metrics.enqueued(), 0);
        assert_eq!(metrics.rotations(), 0);
        assert_eq!(metrics.written(), 0);
    }

    #[test]
    fn test_metrics_clone_is_snapshot() {
        let metrics = LoggerMetrics::new();
        metrics.record_written(2);

        let snapshot = metrics.clone();
        metrics.record_written(1);

        assert_eq!(snapshot.written(), 2);
        assert_eq!(metrics.written(), 3);
    }
}
