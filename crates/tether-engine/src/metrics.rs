//! Cumulative mutation queue counters.
//!
//! [`QueueMetrics`] is a plain snapshot; the live counters are atomics
//! shared between every producer handle and the executor, so any thread
//! can read them without touching the queue.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters since the queue was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueMetrics {
    /// Entries accepted by `schedule` or `schedule_action`.
    pub scheduled: u64,
    /// Entries the executor has taken off the queue.
    pub executed: u64,
    /// Executed entries that ran to completion.
    pub applied: u64,
    /// Executed entries that returned an error or panicked.
    pub failed: u64,
    /// Executed entries that had nothing to do.
    pub skipped: u64,
    /// Stagings that replaced a still-pending same-kind staging.
    pub overwritten: u64,
}

impl QueueMetrics {
    /// Entries scheduled but not yet executed.
    pub fn pending(&self) -> u64 {
        self.scheduled.saturating_sub(self.executed)
    }
}

#[derive(Default)]
pub(crate) struct QueueCounters {
    scheduled: AtomicU64,
    executed: AtomicU64,
    applied: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    overwritten: AtomicU64,
}

impl QueueCounters {
    pub fn record_scheduled(&self) {
        self.scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_overwrite(&self) {
        self.overwritten.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_applied(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
        self.applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> QueueMetrics {
        QueueMetrics {
            scheduled: self.scheduled.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            overwritten: self.overwritten.load(Ordering::Relaxed),
        }
    }
}
