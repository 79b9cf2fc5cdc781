//! Stress tests for spanlog.
//!
//! These runs drive the store with sustained ingestion under a small byte
//! ceiling, and with readers racing writers.

use spanlog_core::{CommitStatus, Config, IngestEntry, LogStore, ManifestFilter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of ingest batches to submit.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Segments per ingest batch.
    pub batch_size: usize,
    /// Bytes of text per segment.
    pub segment_size: usize,
    /// Number of distinct manifests spans are bound to.
    pub manifest_count: usize,
    /// Batches written to a span before the next span of its manifest starts.
    pub span_length: usize,
    /// Byte ceiling of the store under test.
    pub byte_ceiling: u64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            batch_size: 8,
            segment_size: 64,
            manifest_count: 4,
            span_length: 50,
            byte_ceiling: 1 << 20,
        }
    }
}

impl StressConfig {
    /// Builds a store bounded by this configuration's ceiling.
    pub fn store(&self) -> LogStore {
        LogStore::with_config(Config::new().byte_ceiling(self.byte_ceiling))
            .expect("Invalid stress configuration")
    }

    /// The batch submitted as operation `i`.
    ///
    /// Manifests take turns; each manifest moves to a fresh span every
    /// `span_length` batches, the way successive runs of a resource do.
    pub fn batch(&self, i: usize) -> Vec<IngestEntry> {
        let manifests = self.manifest_count.max(1);
        let manifest = i % manifests;
        let run = i / manifests / self.span_length.max(1);
        let span_id = format!("m{manifest}:run-{run}");
        let text = format!("{}\n", "x".repeat(self.segment_size.saturating_sub(1)));

        (0..self.batch_size)
            .map(|_| IngestEntry::new(span_id.clone(), text.clone()).manifest(format!("m{manifest}")))
            .collect()
    }
}

/// Run a sequential ingest stress test against a bounded store.
///
/// An operation fails if the commit reports no change, or if the store is
/// left above its ceiling while holding a span that could have been evicted.
pub fn stress_sequential_ingest(store: &LogStore, config: &StressConfig) -> StressTestResult {
    let ceiling = store.config().byte_ceiling;
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let committed = store.ingest(config.batch(i)).is_committed();
        let bounded = store.size_bytes() <= ceiling
            || store
                .spans_for_manifests(&ManifestFilter::All)
                .iter()
                .all(|s| s.current);

        if committed && bounded {
            successful += 1;
        } else {
            failed += 1;
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a mixed ingest, removal, and view stress test.
pub fn stress_mixed_operations(store: &LogStore, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let ok = if i % 3 == 0 {
            // Ingest (33%)
            store.ingest(config.batch(i)).is_committed()
        } else if i % 3 == 1 {
            // View (33%)
            let filter = ManifestFilter::only([format!("m{}", i % config.manifest_count.max(1))]);
            let view = store.view(&filter);
            view.windows(2).all(|w| w[0].order_key < w[1].order_key)
        } else {
            // Remove (33%)
            let span = format!("m{}:run-{}", i % config.manifest_count.max(1), i % 7);
            !matches!(store.remove_spans([span]), CommitStatus::Deferred)
        };

        if ok {
            successful += 1;
        } else {
            failed += 1;
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a concurrent stress test: one writer thread per `threads`, each
/// paired with a reader that checks view ordering while writes land.
pub fn stress_concurrent_readers(store: Arc<LogStore>, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let threads = config.threads.max(1);
    let ops_per_thread = config.operations / threads;

    let start = Instant::now();

    let mut handles = Vec::with_capacity(threads * 2);
    for t in 0..threads {
        let writer_store = Arc::clone(&store);
        let writer_config = config.clone();
        let writer_ok = Arc::clone(&successful);
        let writer_failed = Arc::clone(&failed);
        handles.push(thread::spawn(move || {
            for i in 0..ops_per_thread {
                // Deferred writes still land once the active round drains.
                match writer_store.ingest(writer_config.batch(t * ops_per_thread + i)) {
                    CommitStatus::Unchanged => writer_failed.fetch_add(1, Ordering::Relaxed),
                    _ => writer_ok.fetch_add(1, Ordering::Relaxed),
                };
            }
        }));

        let reader_store = Arc::clone(&store);
        let reader_ok = Arc::clone(&successful);
        let reader_failed = Arc::clone(&failed);
        handles.push(thread::spawn(move || {
            for _ in 0..ops_per_thread {
                let view = reader_store.view(&ManifestFilter::All);
                if view.windows(2).all(|w| w[0].order_key < w[1].order_key) {
                    reader_ok.fetch_add(1, Ordering::Relaxed);
                } else {
                    reader_failed.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}
