//! Store statistics.
//!
//! Counters are atomic and monotonically increasing; they can be read from
//! any thread while the store is being mutated.
//!
//! # Usage
//!
//! ```rust
//! use spanlog_core::{IngestEntry, LogStore};
//!
//! let store = LogStore::new();
//! store.ingest(vec![IngestEntry::new("s1", "hello\n")]);
//!
//! let stats = store.stats().snapshot();
//! assert_eq!(stats.segments_appended, 1);
//! assert_eq!(stats.bytes_appended, 6);
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Store statistics and counters.
#[derive(Debug, Default)]
pub struct StoreStats {
    // Ingestion
    /// Ingest calls that committed at least one segment.
    ingests_committed: AtomicU64,
    /// Segments appended.
    segments_appended: AtomicU64,
    /// Text bytes appended.
    bytes_appended: AtomicU64,
    /// Ingestion entries skipped as malformed.
    entries_skipped: AtomicU64,

    // Truncation
    /// Eviction passes that removed at least one span.
    eviction_passes: AtomicU64,
    /// Spans removed by eviction.
    spans_evicted: AtomicU64,
    /// Spans removed by explicit request.
    spans_removed: AtomicU64,
    /// Bytes released by any truncation.
    bytes_truncated: AtomicU64,

    // Notification
    /// Listener invocations that completed.
    notifications_delivered: AtomicU64,
    /// Listener invocations that panicked.
    listener_failures: AtomicU64,
    /// Mutations queued because they arrived during notification.
    mutations_deferred: AtomicU64,
}

impl StoreStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_ingest(&self, segments: u64, bytes: u64) {
        self.ingests_committed.fetch_add(1, Ordering::Relaxed);
        self.segments_appended.fetch_add(segments, Ordering::Relaxed);
        self.bytes_appended.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped_entry(&self) {
        self.entries_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self, spans: u64, bytes: u64) {
        self.eviction_passes.fetch_add(1, Ordering::Relaxed);
        self.spans_evicted.fetch_add(spans, Ordering::Relaxed);
        self.bytes_truncated.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_removal(&self, spans: u64, bytes: u64) {
        self.spans_removed.fetch_add(spans, Ordering::Relaxed);
        self.bytes_truncated.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_notify(&self, delivered: u64, failed: u64) {
        self.notifications_delivered
            .fetch_add(delivered, Ordering::Relaxed);
        self.listener_failures.fetch_add(failed, Ordering::Relaxed);
    }

    pub(crate) fn record_deferred(&self) {
        self.mutations_deferred.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of committed ingest calls.
    pub fn ingests_committed(&self) -> u64 {
        self.ingests_committed.load(Ordering::Relaxed)
    }

    /// Returns the number of appended segments.
    pub fn segments_appended(&self) -> u64 {
        self.segments_appended.load(Ordering::Relaxed)
    }

    /// Returns the number of appended text bytes.
    pub fn bytes_appended(&self) -> u64 {
        self.bytes_appended.load(Ordering::Relaxed)
    }

    /// Returns the number of skipped ingestion entries.
    pub fn entries_skipped(&self) -> u64 {
        self.entries_skipped.load(Ordering::Relaxed)
    }

    /// Returns the number of eviction passes.
    pub fn eviction_passes(&self) -> u64 {
        self.eviction_passes.load(Ordering::Relaxed)
    }

    /// Returns the number of evicted spans.
    pub fn spans_evicted(&self) -> u64 {
        self.spans_evicted.load(Ordering::Relaxed)
    }

    /// Returns the number of explicitly removed spans.
    pub fn spans_removed(&self) -> u64 {
        self.spans_removed.load(Ordering::Relaxed)
    }

    /// Returns the number of bytes released by truncation.
    pub fn bytes_truncated(&self) -> u64 {
        self.bytes_truncated.load(Ordering::Relaxed)
    }

    /// Returns the number of delivered notifications.
    pub fn notifications_delivered(&self) -> u64 {
        self.notifications_delivered.load(Ordering::Relaxed)
    }

    /// Returns the number of listener panics.
    pub fn listener_failures(&self) -> u64 {
        self.listener_failures.load(Ordering::Relaxed)
    }

    /// Returns the number of deferred mutations.
    pub fn mutations_deferred(&self) -> u64 {
        self.mutations_deferred.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            ingests_committed: self.ingests_committed(),
            segments_appended: self.segments_appended(),
            bytes_appended: self.bytes_appended(),
            entries_skipped: self.entries_skipped(),
            eviction_passes: self.eviction_passes(),
            spans_evicted: self.spans_evicted(),
            spans_removed: self.spans_removed(),
            bytes_truncated: self.bytes_truncated(),
            notifications_delivered: self.notifications_delivered(),
            listener_failures: self.listener_failures(),
            mutations_deferred: self.mutations_deferred(),
        }
    }
}

/// A point-in-time snapshot of store statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Committed ingest calls.
    pub ingests_committed: u64,
    /// Appended segments.
    pub segments_appended: u64,
    /// Appended text bytes.
    pub bytes_appended: u64,
    /// Skipped ingestion entries.
    pub entries_skipped: u64,
    /// Eviction passes.
    pub eviction_passes: u64,
    /// Evicted spans.
    pub spans_evicted: u64,
    /// Explicitly removed spans.
    pub spans_removed: u64,
    /// Bytes released by truncation.
    pub bytes_truncated: u64,
    /// Delivered notifications.
    pub notifications_delivered: u64,
    /// Listener panics.
    pub listener_failures: u64,
    /// Deferred mutations.
    pub mutations_deferred: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = StoreStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn record_operations() {
        let stats = StoreStats::new();
        stats.record_ingest(3, 120);
        stats.record_ingest(1, 10);
        stats.record_eviction(2, 100);
        stats.record_removal(1, 5);
        stats.record_notify(4, 1);

        let snap = stats.snapshot();
        assert_eq!(snap.ingests_committed, 2);
        assert_eq!(snap.segments_appended, 4);
        assert_eq!(snap.bytes_appended, 130);
        assert_eq!(snap.eviction_passes, 1);
        assert_eq!(snap.spans_evicted, 2);
        assert_eq!(snap.spans_removed, 1);
        assert_eq!(snap.bytes_truncated, 105);
        assert_eq!(snap.notifications_delivered, 4);
        assert_eq!(snap.listener_failures, 1);
    }
}
