//! Tracker counters.
//! One `TrackerMetrics` per engine; counters are relaxed atomics read via `snapshot()`.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Default)]
pub struct TrackerMetrics {
    passes_completed: AtomicU64,
    passes_rejected: AtomicU64,
    ticks_not_due: AtomicU64,
    profiles_processed: AtomicU64,
    profiles_skipped: AtomicU64,
    incremental_applied: AtomicU64,
    incremental_ignored: AtomicU64,
    last_pass_micros: AtomicU64,
}

impl TrackerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pass(&self, processed: u64, skipped: u64, elapsed: Duration) {
        self.passes_completed.fetch_add(1, Ordering::Relaxed);
        self.profiles_processed.fetch_add(processed, Ordering::Relaxed);
        self.profiles_skipped.fetch_add(skipped, Ordering::Relaxed);
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.last_pass_micros.store(micros, Ordering::Relaxed);
    }

    pub fn inc_pass_rejected(&self) {
        self.passes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tick_not_due(&self) {
        self.ticks_not_due.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_incremental_applied(&self) {
        self.incremental_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_incremental_ignored(&self) {
        self.incremental_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let micros = self.last_pass_micros.load(Ordering::Relaxed);
        let passes = self.passes_completed.load(Ordering::Relaxed);
        MetricsSnapshot {
            passes_completed: passes,
            passes_rejected: self.passes_rejected.load(Ordering::Relaxed),
            ticks_not_due: self.ticks_not_due.load(Ordering::Relaxed),
            profiles_processed: self.profiles_processed.load(Ordering::Relaxed),
            profiles_skipped: self.profiles_skipped.load(Ordering::Relaxed),
            incremental_applied: self.incremental_applied.load(Ordering::Relaxed),
            incremental_ignored: self.incremental_ignored.load(Ordering::Relaxed),
            last_pass_duration: if passes > 0 {
                Some(Duration::from_micros(micros))
            } else {
                None
            },
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub passes_completed: u64,
    pub passes_rejected: u64,
    pub ticks_not_due: u64,
    pub profiles_processed: u64,
    pub profiles_skipped: u64,
    pub incremental_applied: u64,
    pub incremental_ignored: u64,
    pub last_pass_duration: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_counters_accumulate() {
        let metrics = TrackerMetrics::new();
        assert_eq!(metrics.snapshot().last_pass_duration, None);

        metrics.record_pass(3, 1, Duration::from_millis(4));
        metrics.record_pass(2, 0, Duration::from_millis(7));
        metrics.inc_pass_rejected();
        metrics.inc_tick_not_due();
        metrics.inc_tick_not_due();

        let snap = metrics.snapshot();
        assert_eq!(snap.passes_completed, 2);
        assert_eq!(snap.profiles_processed, 5);
        assert_eq!(snap.profiles_skipped, 1);
        assert_eq!(snap.passes_rejected, 1);
        assert_eq!(snap.ticks_not_due, 2);
        assert_eq!(snap.last_pass_duration, Some(Duration::from_millis(7)));
    }

    #[test]
    fn incremental_counters() {
        let metrics = TrackerMetrics::new();
        metrics.inc_incremental_applied();
        metrics.inc_incremental_ignored();
        metrics.inc_incremental_ignored();
        let snap = metrics.snapshot();
        assert_eq!(snap.incremental_applied, 1);
        assert_eq!(snap.incremental_ignored, 2);
    }
}
