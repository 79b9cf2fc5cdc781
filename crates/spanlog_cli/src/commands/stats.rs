//! Stats command implementation.

use super::{format_size, replay_feed, StoreOptions};
use serde::Serialize;
use spanlog_core::{LogStore, StatsSnapshot};
use std::path::Path;

/// Store statistics after a replay.
#[derive(Debug, Serialize)]
pub struct StatsResult {
    /// Feed path.
    pub path: String,
    /// Configured byte ceiling.
    pub byte_ceiling: u64,
    /// Retained text size in bytes.
    pub retained_bytes: u64,
    /// Retained spans.
    pub span_count: usize,
    /// Retained segments.
    pub segment_count: usize,
    /// Manifests with at least one retained span.
    pub manifests: Vec<String>,
    /// Highest order key assigned.
    pub upper_order_key: u64,
    /// Counters accumulated during the replay.
    pub counters: StatsSnapshot,
}

/// Runs the stats command.
pub fn run(
    path: &Path,
    format: &str,
    options: &StoreOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = replay_feed(path, options)?;
    let result = collect(path, &store);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn collect(path: &Path, store: &LogStore) -> StatsResult {
    StatsResult {
        path: path.display().to_string(),
        byte_ceiling: store.config().byte_ceiling,
        retained_bytes: store.size_bytes(),
        span_count: store.span_count(),
        segment_count: store.segment_count(),
        manifests: store.manifest_names(),
        upper_order_key: store.upper_order_key().as_u64(),
        counters: store.stats().snapshot(),
    }
}

fn print_text_output(result: &StatsResult) {
    let c = &result.counters;

    println!("spanlog Replay Statistics");
    println!("=========================");
    println!();
    println!("Feed: {}", result.path);
    println!();
    println!("Retained:");
    println!(
        "  Size:      {} of {}",
        format_size(result.retained_bytes),
        format_size(result.byte_ceiling)
    );
    println!("  Spans:     {}", result.span_count);
    println!("  Segments:  {}", result.segment_count);
    println!("  Manifests: {}", result.manifests.join(", "));
    println!("  Upper key: {}", result.upper_order_key);
    println!();
    println!("Ingestion:");
    println!("  Commits:   {}", c.ingests_committed);
    println!("  Segments:  {}", c.segments_appended);
    println!("  Bytes:     {}", format_size(c.bytes_appended));
    println!("  Skipped:   {}", c.entries_skipped);
    println!();
    println!("Truncation:");
    println!("  Eviction passes: {}", c.eviction_passes);
    println!("  Spans evicted:   {}", c.spans_evicted);
    println!("  Bytes released:  {}", format_size(c.bytes_truncated));
}
