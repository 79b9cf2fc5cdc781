//! Property-based test generators using proptest.
//!
//! Provides strategies for generating ingestion traffic and store
//! operation sequences.

use proptest::prelude::*;
use spanlog_core::{
    CommitStatus, FeedBatch, FeedSegment, Fields, IngestEntry, LogStore, ManifestFilter, SpanId,
};

/// Strategy for span ids drawn from a small pool, so spans repeat.
pub fn span_id_strategy() -> impl Strategy<Value = SpanId> {
    (0u8..8).prop_map(|n| SpanId::new(format!("span-{n}")))
}

/// Strategy for manifest names drawn from a small pool.
pub fn manifest_name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["web", "api", "db", "worker"]).prop_map(str::to_string)
}

/// Strategy for segment text, including partial lines and blank lines.
pub fn segment_text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 .:]{0,24}\n?")
        .expect("Invalid regex")
}

/// Strategy for optional structured fields.
pub fn fields_strategy() -> impl Strategy<Value = Fields> {
    prop::collection::btree_map("[a-z]{1,8}", "[a-z0-9]{0,8}", 0..2)
}

/// Strategy for a single ingest entry.
pub fn ingest_entry_strategy() -> impl Strategy<Value = IngestEntry> {
    (
        span_id_strategy(),
        prop::option::of(manifest_name_strategy()),
        segment_text_strategy(),
        fields_strategy(),
    )
        .prop_map(|(span_id, manifest_name, text, fields)| IngestEntry {
            span_id,
            manifest_name,
            text,
            fields,
        })
}

/// Strategy for a transport feed batch.
pub fn feed_batch_strategy() -> impl Strategy<Value = FeedBatch> {
    (
        span_id_strategy(),
        prop::option::of(manifest_name_strategy()),
        prop::collection::vec(
            (segment_text_strategy(), fields_strategy())
                .prop_map(|(text, fields)| FeedSegment { text, fields }),
            0..4,
        ),
    )
        .prop_map(|(span_id, manifest_name, segments)| FeedBatch {
            span_id,
            manifest_name,
            segments,
        })
}

/// A store operation for sequence testing.
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Ingest a batch
    Ingest {
        /// Batch entries
        entries: Vec<IngestEntry>,
    },
    /// Remove spans by id
    Remove {
        /// Span ids
        spans: Vec<SpanId>,
    },
    /// Remove spans by manifest
    RemoveManifests {
        /// Manifest names
        manifests: Vec<String>,
    },
    /// Bind a span to a manifest
    Bind {
        /// Span id
        span_id: SpanId,
        /// Manifest name
        manifest_name: String,
    },
}

impl StoreOperation {
    /// Applies the operation to a store.
    pub fn apply(&self, store: &LogStore) -> CommitStatus {
        match self {
            Self::Ingest { entries } => store.ingest(entries.clone()),
            Self::Remove { spans } => store.remove_spans(spans.clone()),
            Self::RemoveManifests { manifests } => {
                store.remove_spans_for_manifests(&ManifestFilter::only(manifests.clone()))
            }
            Self::Bind {
                span_id,
                manifest_name,
            } => store.bind_manifest(span_id.clone(), manifest_name.clone()),
        }
    }
}

/// Strategy for generating store operations.
pub fn store_operation_strategy() -> impl Strategy<Value = StoreOperation> {
    prop_oneof![
        6 => prop::collection::vec(ingest_entry_strategy(), 0..6)
            .prop_map(|entries| StoreOperation::Ingest { entries }),
        1 => prop::collection::vec(span_id_strategy(), 0..3)
            .prop_map(|spans| StoreOperation::Remove { spans }),
        1 => prop::collection::vec(manifest_name_strategy(), 1..3)
            .prop_map(|manifests| StoreOperation::RemoveManifests { manifests }),
        1 => (span_id_strategy(), manifest_name_strategy())
            .prop_map(|(span_id, manifest_name)| StoreOperation::Bind { span_id, manifest_name }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(store_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
