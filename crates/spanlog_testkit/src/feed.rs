//! Feed file helpers.
//!
//! Writes transport batches as JSON lines into temporary files, the format
//! the CLI replays.

use spanlog_core::{FeedBatch, FeedSegment, SpanId};
use std::io::Write;
use tempfile::NamedTempFile;

/// Builds a feed batch from plain texts.
pub fn batch(span_id: &str, manifest_name: Option<&str>, texts: &[&str]) -> FeedBatch {
    FeedBatch {
        span_id: SpanId::new(span_id),
        manifest_name: manifest_name.map(str::to_string),
        segments: texts
            .iter()
            .map(|t| FeedSegment {
                text: t.to_string(),
                fields: Default::default(),
            })
            .collect(),
    }
}

/// Serializes batches as JSON lines.
pub fn to_json_lines(batches: &[FeedBatch]) -> String {
    batches
        .iter()
        .map(|b| serde_json::to_string(b).expect("Failed to serialize batch"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes batches to a temporary JSON-lines file.
pub fn write_feed_file(batches: &[FeedBatch]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "{}", to_json_lines(batches)).expect("Failed to write feed");
    file.flush().expect("Failed to flush feed");
    file
}
