//! Test fixtures and store helpers.
//!
//! Provides stores with an attached event recorder and the canonical
//! scenarios used across the test suites.

use parking_lot::Mutex;
use spanlog_core::{Config, LogStore, LogUpdateAction, LogUpdateEvent, SubscriptionHandle};
use std::sync::Arc;

/// Records every event a store delivers.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<LogUpdateEvent>>>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes the log to a store.
    pub fn attach(&self, store: &LogStore) -> SubscriptionHandle {
        let sink = Arc::clone(&self.events);
        store.subscribe(move |e: &LogUpdateEvent| sink.lock().push(e.clone()))
    }

    /// All recorded events in delivery order.
    pub fn events(&self) -> Vec<LogUpdateEvent> {
        self.events.lock().clone()
    }

    /// Actions of the recorded events.
    pub fn actions(&self) -> Vec<LogUpdateAction> {
        self.events.lock().iter().map(|e| e.action).collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// A store with an event log already attached.
pub struct TestStore {
    /// The store, shareable with listeners that mutate it.
    pub store: Arc<LogStore>,
    /// Events delivered by the store.
    pub events: EventLog,
}

impl TestStore {
    /// Creates a store with the default configuration.
    pub fn new() -> Self {
        Self::from_store(LogStore::new())
    }

    /// Creates a store with a small byte ceiling, for eviction tests.
    pub fn bounded(byte_ceiling: u64, eviction_target_ratio: f64) -> Self {
        let config = Config::new()
            .byte_ceiling(byte_ceiling)
            .eviction_target_ratio(eviction_target_ratio);
        Self::from_store(LogStore::with_config(config).expect("Invalid test configuration"))
    }

    fn from_store(store: LogStore) -> Self {
        let events = EventLog::new();
        events.attach(&store);
        Self {
            store: Arc::new(store),
            events,
        }
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestStore {
    type Target = LogStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a fresh store and its event log.
pub fn with_test_store<F, R>(f: F) -> R
where
    F: FnOnce(&LogStore, &EventLog) -> R,
{
    let test_store = TestStore::new();
    f(&test_store.store, &test_store.events)
}

/// Canonical store scenarios.
pub mod scenarios {
    use super::*;
    use spanlog_core::IngestEntry;

    /// Two manifests building at once: "web" (`build-1`) and "api" (`build-2`).
    pub fn two_manifests() -> TestStore {
        let test_store = TestStore::new();
        test_store.ingest(vec![
            IngestEntry::new("build-1", "Compiling\n").manifest("web"),
            IngestEntry::new("build-1", "Done\n").manifest("web"),
        ]);
        test_store.ingest(vec![IngestEntry::new("build-2", "Starting\n").manifest("api")]);
        test_store.events.clear();
        test_store
    }

    /// A store holding `runs` successive spans of one manifest, each with
    /// `segment_bytes` bytes of text.
    pub fn successive_runs(manifest: &str, runs: usize, segment_bytes: usize) -> TestStore {
        let test_store = TestStore::new();
        for run in 0..runs {
            let text = format!("{:<width$}\n", run, width = segment_bytes.saturating_sub(1));
            test_store.ingest(vec![
                IngestEntry::new(format!("{manifest}:run-{run}"), text).manifest(manifest)
            ]);
        }
        test_store.events.clear();
        test_store
    }
}
