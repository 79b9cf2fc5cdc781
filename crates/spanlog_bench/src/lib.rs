//! Benchmark utilities.

use rand::distributions::Alphanumeric;
use rand::Rng;
use spanlog_core::{IngestEntry, LogStore};

/// Generate a random log line of the specified size, newline included.
pub fn random_line(size: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut line: String = (0..size.saturating_sub(1))
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect();
    line.push('\n');
    line
}

/// Generate a batch of entries spread round-robin over `spans` spans, each
/// bound to one of `manifests` manifests.
pub fn generate_batch(
    count: usize,
    spans: usize,
    manifests: usize,
    line_size: usize,
) -> Vec<IngestEntry> {
    let spans = spans.max(1);
    let manifests = manifests.max(1);
    (0..count)
        .map(|i| {
            let span = i % spans;
            IngestEntry::new(format!("span-{span}"), random_line(line_size))
                .manifest(format!("manifest-{}", span % manifests))
        })
        .collect()
}

/// Build a store holding `segments` segments in batches of 100.
pub fn populated_store(segments: usize, spans: usize, manifests: usize) -> LogStore {
    let store = LogStore::new();
    for _ in 0..segments / 100 {
        store.ingest(generate_batch(100, spans, manifests, 80));
    }
    store
}
