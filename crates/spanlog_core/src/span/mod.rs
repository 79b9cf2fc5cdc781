//! Spans and the span index.
//!
//! A span is an append-only run of segments produced by one logical run
//! (a build attempt, a process, a pod). Spans appear implicitly on their
//! first segment and disappear only when truncated as a whole.

mod index;

pub use index::{BindOutcome, RemovedSpan, SpanIndex};

use crate::types::{OrderKey, SpanId};
use serde::Serialize;
use std::time::SystemTime;

/// Metadata of a retained span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub(crate) id: SpanId,
    pub(crate) manifest_name: Option<String>,
    pub(crate) start_time: SystemTime,
    pub(crate) first_segment_key: OrderKey,
    pub(crate) last_segment_key: OrderKey,
    pub(crate) byte_size: u64,
    pub(crate) segment_count: usize,
}

impl Span {
    pub(crate) fn new(id: SpanId, manifest_name: Option<String>, first_key: OrderKey) -> Self {
        Self {
            id,
            manifest_name,
            start_time: SystemTime::now(),
            first_segment_key: first_key,
            last_segment_key: first_key,
            byte_size: 0,
            segment_count: 0,
        }
    }

    /// Span id.
    #[must_use]
    pub fn id(&self) -> &SpanId {
        &self.id
    }

    /// Manifest the span is bound to, if the binding has arrived.
    #[must_use]
    pub fn manifest_name(&self) -> Option<&str> {
        self.manifest_name.as_deref()
    }

    /// Wall-clock time the span was first seen.
    #[must_use]
    pub fn start_time(&self) -> SystemTime {
        self.start_time
    }

    /// Order key of the span's first retained segment.
    #[must_use]
    pub fn first_segment_key(&self) -> OrderKey {
        self.first_segment_key
    }

    /// Order key of the span's latest segment.
    #[must_use]
    pub fn last_segment_key(&self) -> OrderKey {
        self.last_segment_key
    }

    /// Retained text size in bytes.
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// Number of retained segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }
}

/// Span metadata together with its run status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpanSummary {
    /// The span.
    #[serde(flatten)]
    pub span: Span,
    /// Whether this is the most recent span of its manifest.
    pub current: bool,
}
