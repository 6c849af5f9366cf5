//! Counters for filter and drop-ring activity
//!
//! All counters are relaxed atomics; a [`MetricsSnapshot`] is a consistent
//! enough point-in-time copy for logs and the node's status output.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Metrics collector for change tracking
#[derive(Debug, Default)]
pub struct TrackingMetrics {
    /// Modification events that hit a bound filter
    pub bits_set: AtomicU64,
    /// Filters moved out of the directory by readers
    pub filters_taken: AtomicU64,
    /// Filters OR'd back after an aborted read
    pub filters_merged_back: AtomicU64,
    /// Read transactions committed
    pub reads_committed: AtomicU64,
    /// Read transactions aborted
    pub reads_aborted: AtomicU64,
    /// Rows returned to readers
    pub rows_emitted: AtomicU64,
    /// Drop events recorded in the ring
    pub drops_recorded: AtomicU64,
    /// Drop records evicted by overflow
    pub drops_evicted: AtomicU64,
    /// Drop records re-inserted on abort
    pub drops_restored: AtomicU64,
    /// Drop records lost on abort because the ring was full
    pub drops_discarded: AtomicU64,
}

impl TrackingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_bit_set(&self) {
        self.bits_set.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_take(&self) {
        self.filters_taken.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_merge_back(&self) {
        self.filters_merged_back.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_commit(&self, rows: usize) {
        self.reads_committed.fetch_add(1, Ordering::Relaxed);
        self.rows_emitted.fetch_add(rows as u64, Ordering::Relaxed);
    }

    pub fn record_abort(&self) {
        self.reads_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a drop; `evicted` is true when it pushed the oldest record out.
    pub fn record_drop(&self, evicted: bool) {
        self.drops_recorded.fetch_add(1, Ordering::Relaxed);
        if evicted {
            self.drops_evicted.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an undo of `attempted` drops of which `restored` fit.
    pub fn record_undo(&self, attempted: usize, restored: usize) {
        self.drops_restored
            .fetch_add(restored as u64, Ordering::Relaxed);
        self.drops_discarded
            .fetch_add(attempted.saturating_sub(restored) as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bits_set: self.bits_set.load(Ordering::Relaxed),
            filters_taken: self.filters_taken.load(Ordering::Relaxed),
            filters_merged_back: self.filters_merged_back.load(Ordering::Relaxed),
            reads_committed: self.reads_committed.load(Ordering::Relaxed),
            reads_aborted: self.reads_aborted.load(Ordering::Relaxed),
            rows_emitted: self.rows_emitted.load(Ordering::Relaxed),
            drops_recorded: self.drops_recorded.load(Ordering::Relaxed),
            drops_evicted: self.drops_evicted.load(Ordering::Relaxed),
            drops_restored: self.drops_restored.load(Ordering::Relaxed),
            drops_discarded: self.drops_discarded.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub bits_set: u64,
    pub filters_taken: u64,
    pub filters_merged_back: u64,
    pub reads_committed: u64,
    pub reads_aborted: u64,
    pub rows_emitted: u64,
    pub drops_recorded: u64,
    pub drops_evicted: u64,
    pub drops_restored: u64,
    pub drops_discarded: u64,
}
