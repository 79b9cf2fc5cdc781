//! Ingestion feed payloads.
//!
//! The transport delivers batches shaped as
//! `{"spanId": "...", "manifestName": "...", "segments": [{"text": "...", "fields": {...}}]}`.
//! Delivery order is send order; the same span id may appear in many
//! batches and its segments accumulate.

use crate::error::{CoreError, CoreResult};
use crate::segment::{Fields, IngestEntry};
use crate::types::SpanId;
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// One segment of a feed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSegment {
    /// Segment text.
    pub text: String,
    /// Optional structured annotations.
    #[serde(default, skip_serializing_if = "Fields::is_empty")]
    pub fields: Fields,
}

/// A batch of segments for one span, as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedBatch {
    /// Span the segments belong to.
    pub span_id: SpanId,
    /// Manifest binding delivered with the batch, if known yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_name: Option<String>,
    /// Segments in send order.
    #[serde(default)]
    pub segments: Vec<FeedSegment>,
}

impl FeedBatch {
    /// Converts the batch into ingest entries, preserving order.
    pub fn into_entries(self) -> Vec<IngestEntry> {
        let FeedBatch {
            span_id,
            manifest_name,
            segments,
        } = self;
        segments
            .into_iter()
            .map(|seg| IngestEntry {
                span_id: span_id.clone(),
                manifest_name: manifest_name.clone(),
                text: seg.text,
                fields: seg.fields,
            })
            .collect()
    }
}

/// Flattens several batches into the entries of a single ingest call.
pub fn entries_from_batches<I>(batches: I) -> Vec<IngestEntry>
where
    I: IntoIterator<Item = FeedBatch>,
{
    batches
        .into_iter()
        .flat_map(FeedBatch::into_entries)
        .collect()
}

/// Decodes one JSON batch.
///
/// A batch whose span id is empty cannot be attributed to any span and is
/// rejected.
pub fn decode_batch(json: &str) -> CoreResult<FeedBatch> {
    let batch: FeedBatch = serde_json::from_str(json)?;
    if batch.span_id.is_empty() {
        return Err(CoreError::invalid_span_id(batch.span_id.as_str()));
    }
    Ok(batch)
}

/// Decodes a JSON-lines feed, one batch per non-blank line.
pub fn decode_lines<R: BufRead>(reader: R) -> impl Iterator<Item = CoreResult<FeedBatch>> {
    reader.lines().filter_map(|line| match line {
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => Some(decode_batch(&line)),
        Err(e) => Some(Err(e.into())),
    })
}
