//! Run progress reporting
//!
//! A [`RunProgress`] handle can be cloned and read from another thread while a
//! run executes. It exposes how far the virtual clock has advanced and how many
//! passengers are done, never the event queue itself.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct ProgressCounters {
    virtual_time_bits: AtomicU64,
    completed: AtomicUsize,
    total: AtomicUsize,
    events: AtomicU64,
}

/// Shared progress counters of a run
#[derive(Debug, Clone, Default)]
pub struct RunProgress {
    counters: Arc<ProgressCounters>,
}

/// Point-in-time copy of the progress counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// Virtual time reached, seconds after t0
    pub virtual_time_s: f64,
    /// Passengers that completed their path
    pub completed: usize,
    /// Passengers in the run
    pub total: usize,
    /// Events processed
    pub events: u64,
}

impl ProgressSnapshot {
    /// Completed share of passengers in [0, 1]; 1 when there is nobody to process
    pub fn fraction_complete(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

impl RunProgress {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a run with `total` passengers
    pub fn start(&self, total: usize) {
        self.counters.virtual_time_bits.store(0f64.to_bits(), Ordering::Relaxed);
        self.counters.completed.store(0, Ordering::Relaxed);
        self.counters.events.store(0, Ordering::Relaxed);
        self.counters.total.store(total, Ordering::Relaxed);
    }

    /// Advance the virtual clock; the stored value never decreases
    pub fn advance_to(&self, time_s: f64) {
        // Non-negative f64 values order the same way as their bit patterns
        if time_s >= 0.0 {
            self.counters.virtual_time_bits.fetch_max(time_s.to_bits(), Ordering::Relaxed);
        }
    }

    /// Count one processed event
    pub fn event_processed(&self) {
        self.counters.events.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one passenger that finished its path
    pub fn passenger_completed(&self) {
        self.counters.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            virtual_time_s: f64::from_bits(self.counters.virtual_time_bits.load(Ordering::Relaxed)),
            completed: self.counters.completed.load(Ordering::Relaxed),
            total: self.counters.total.load(Ordering::Relaxed),
            events: self.counters.events.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_time_is_monotonic() {
        let progress = RunProgress::new();
        progress.start(10);
        progress.advance_to(50.0);
        progress.advance_to(20.0);
        assert_eq!(progress.snapshot().virtual_time_s, 50.0);
        progress.advance_to(75.5);
        assert_eq!(progress.snapshot().virtual_time_s, 75.5);
    }

    #[test]
    fn test_clones_share_counters() {
        let progress = RunProgress::new();
        let observer = progress.clone();
        progress.start(4);
        progress.passenger_completed();
        progress.passenger_completed();
        progress.event_processed();

        let snapshot = observer.snapshot();
        assert_eq!(snapshot.completed, 2);
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.events, 1);
        assert_eq!(snapshot.fraction_complete(), 0.5);
    }

    #[test]
    fn test_empty_run_is_complete() {
        let progress = RunProgress::new();
        progress.start(0);
        assert_eq!(progress.snapshot().fraction_complete(), 1.0);
    }
}
