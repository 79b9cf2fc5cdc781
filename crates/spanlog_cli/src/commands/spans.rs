//! Spans command implementation.

use super::{format_size, replay_feed, StoreOptions};
use serde::Serialize;
use spanlog_core::{LogStore, ManifestFilter, SpanSummary};
use std::path::Path;

/// Retained spans after a replay.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpansResult {
    /// Feed path.
    pub path: String,
    /// Retained text size in bytes.
    pub total_bytes: u64,
    /// Spans, oldest first.
    pub spans: Vec<SpanSummary>,
}

/// Runs the spans command.
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
            print!("{}", format_text_output(&result));
        }
    }

    Ok(())
}

fn collect(path: &Path, store: &LogStore) -> SpansResult {
    SpansResult {
        path: path.display().to_string(),
        total_bytes: store.size_bytes(),
        spans: store.spans_for_manifests(&ManifestFilter::All),
    }
}

fn format_text_output(result: &SpansResult) -> String {
    let mut out = format!(
        "Retained spans in {}\nTotal size: {}\n\n",
        result.path,
        format_size(result.total_bytes)
    );

    for summary in &result.spans {
        let span = &summary.span;
        out.push_str(&format!(
            "{}{} [{}] {} segments, {}, keys {}..{}\n",
            if summary.current { "* " } else { "  " },
            span.id(),
            span.manifest_name().unwrap_or("-"),
            span.segment_count(),
            format_size(span.byte_size()),
            span.first_segment_key().as_u64(),
            span.last_segment_key().as_u64(),
        ));
    }
    out
}
