//! Span index: span id to ordered segments, plus manifest grouping.

use super::{Span, SpanSummary};
use crate::segment::Segment;
use crate::types::{OrderKey, SpanId};
use crate::view::ManifestFilter;
use std::collections::{BTreeMap, HashMap};

/// Spans sharing a manifest, keyed by first segment key.
///
/// Unbound spans share the `None` group.
type ManifestGroups = HashMap<Option<String>, BTreeMap<OrderKey, SpanId>>;

/// Outcome of binding a span to a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// The span has not been seen yet; the binding applies on its first segment.
    Pending,
    /// The span was already bound to this manifest.
    Unchanged,
    /// The span moved from `previous` to the new manifest.
    Rebound {
        /// Manifest the span was bound to before, if any.
        previous: Option<String>,
    },
}

/// A span taken out of the index, with its segments.
#[derive(Debug, Clone)]
pub struct RemovedSpan {
    /// Span metadata at removal time.
    pub span: Span,
    /// The removed segments in order.
    pub segments: Vec<Segment>,
}

#[derive(Debug)]
struct SpanEntry {
    span: Span,
    segments: Vec<Segment>,
}

/// Mapping from span id to its segments and metadata.
///
/// Invariants:
/// - segments of a span are stored in order key order
/// - `byte_size` is the sum of retained segment sizes
/// - a span with no segments is not stored
#[derive(Debug, Default)]
pub struct SpanIndex {
    spans: HashMap<SpanId, SpanEntry>,
    groups: ManifestGroups,
    pending_bindings: HashMap<SpanId, String>,
    byte_size: u64,
    segment_count: usize,
}

impl SpanIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a segment, creating its span on first sight.
    ///
    /// Returns true if the span was created.
    pub fn append(&mut self, segment: Segment) -> bool {
        let key = segment.order_key();
        let size = segment.byte_size();
        self.byte_size += size;
        self.segment_count += 1;

        if let Some(entry) = self.spans.get_mut(segment.span_id()) {
            debug_assert!(key > entry.span.last_segment_key);
            entry.span.last_segment_key = key;
            entry.span.byte_size += size;
            entry.span.segment_count += 1;
            entry.segments.push(segment);
            return false;
        }

        let id = segment.span_id().clone();
        let manifest = self.pending_bindings.remove(&id);
        let mut span = Span::new(id.clone(), manifest.clone(), key);
        span.byte_size = size;
        span.segment_count = 1;
        self.groups.entry(manifest).or_default().insert(key, id.clone());
        self.spans.insert(
            id,
            SpanEntry {
                span,
                segments: vec![segment],
            },
        );
        true
    }

    /// Binds a span to a manifest without re-keying its segments.
    pub fn bind_manifest(&mut self, span_id: &SpanId, manifest_name: String) -> BindOutcome {
        let Some(entry) = self.spans.get_mut(span_id) else {
            self.pending_bindings.insert(span_id.clone(), manifest_name);
            return BindOutcome::Pending;
        };

        if entry.span.manifest_name.as_deref() == Some(manifest_name.as_str()) {
            return BindOutcome::Unchanged;
        }

        let first = entry.span.first_segment_key;
        let previous = entry.span.manifest_name.replace(manifest_name.clone());
        ungroup(&mut self.groups, &previous, first);
        self.groups
            .entry(Some(manifest_name))
            .or_default()
            .insert(first, span_id.clone());
        BindOutcome::Rebound { previous }
    }

    /// Removes a whole span.
    pub fn remove(&mut self, span_id: &SpanId) -> Option<RemovedSpan> {
        let SpanEntry { span, segments } = self.spans.remove(span_id)?;
        self.byte_size -= span.byte_size;
        self.segment_count -= span.segment_count;
        ungroup(&mut self.groups, &span.manifest_name, span.first_segment_key);
        Some(RemovedSpan { span, segments })
    }

    /// Metadata of a retained span.
    pub fn span(&self, span_id: &SpanId) -> Option<&Span> {
        self.spans.get(span_id).map(|e| &e.span)
    }

    /// Segments of a retained span, in order.
    pub fn segments(&self, span_id: &SpanId) -> Option<&[Segment]> {
        self.spans.get(span_id).map(|e| e.segments.as_slice())
    }

    /// Iterates over retained spans with their segments, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Span, &[Segment])> {
        self.spans
            .values()
            .map(|e| (&e.span, e.segments.as_slice()))
    }

    /// Returns true if the span is the most recent span of its manifest.
    pub fn is_current(&self, span: &Span) -> bool {
        self.groups
            .get(&span.manifest_name)
            .and_then(|group| group.last_key_value())
            .is_some_and(|(_, id)| *id == span.id)
    }

    /// Most recent span of a manifest (`None` selects unbound spans).
    pub fn current_span(&self, manifest_name: Option<&str>) -> Option<&SpanId> {
        self.groups
            .get(&manifest_name.map(str::to_string))
            .and_then(|group| group.last_key_value())
            .map(|(_, id)| id)
    }

    /// Spans matching a filter, oldest first.
    pub fn spans_for_manifests(&self, filter: &ManifestFilter) -> Vec<SpanSummary> {
        if !filter.is_valid() {
            return Vec::new();
        }
        let mut spans: Vec<SpanSummary> = self
            .spans
            .values()
            .filter(|e| filter.matches(e.span.manifest_name.as_deref()))
            .map(|e| SpanSummary {
                span: e.span.clone(),
                current: self.is_current(&e.span),
            })
            .collect();
        spans.sort_by_key(|s| s.span.first_segment_key);
        spans
    }

    /// Sorted names of manifests with retained spans.
    pub fn manifest_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.keys().flatten().cloned().collect();
        names.sort();
        names
    }

    /// Retained text size in bytes.
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// Number of retained segments.
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Number of retained spans.
    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    /// Number of bindings waiting for their span's first segment.
    pub fn pending_binding_count(&self) -> usize {
        self.pending_bindings.len()
    }

    /// Forgets every binding for a span that has not appeared yet.
    pub fn drop_pending_bindings(&mut self) -> usize {
        let dropped = self.pending_bindings.len();
        self.pending_bindings.clear();
        dropped
    }

    /// Ids of all retained spans.
    pub fn span_ids(&self) -> Vec<SpanId> {
        self.spans.keys().cloned().collect()
    }

    /// Returns true if no spans are retained.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

fn ungroup(groups: &mut ManifestGroups, manifest: &Option<String>, first_key: OrderKey) {
    if let Some(group) = groups.get_mut(manifest) {
        group.remove(&first_key);
        if group.is_empty() {
            groups.remove(manifest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Fields;

    fn seg(span: &str, key: u64, text: &str) -> Segment {
        Segment::new(SpanId::new(span), OrderKey::new(key), text.into(), Fields::new())
    }

    #[test]
    fn append_creates_span_lazily() {
        let mut index = SpanIndex::new();
        assert!(index.append(seg("s1", 1, "abc")));
        assert!(!index.append(seg("s1", 2, "de")));

        let span = index.span(&SpanId::new("s1")).unwrap();
        assert_eq!(span.first_segment_key(), OrderKey::new(1));
        assert_eq!(span.last_segment_key(), OrderKey::new(2));
        assert_eq!(span.byte_size(), 5);
        assert_eq!(span.segment_count(), 2);
        assert_eq!(span.manifest_name(), None);
        assert_eq!(index.byte_size(), 5);
        assert_eq!(index.segment_count(), 2);
    }

    #[test]
    fn pending_binding_applies_on_first_segment() {
        let mut index = SpanIndex::new();
        let id = SpanId::new("s1");
        assert_eq!(index.bind_manifest(&id, "web".into()), BindOutcome::Pending);
        index.append(seg("s1", 1, "x"));
        assert_eq!(index.span(&id).unwrap().manifest_name(), Some("web"));
        assert_eq!(index.current_span(Some("web")), Some(&id));
    }

    #[test]
    fn dropped_pending_binding_is_not_applied() {
        let mut index = SpanIndex::new();
        index.bind_manifest(&SpanId::new("s1"), "web".into());
        index.bind_manifest(&SpanId::new("s2"), "api".into());
        assert_eq!(index.pending_binding_count(), 2);

        assert_eq!(index.drop_pending_bindings(), 2);
        assert_eq!(index.pending_binding_count(), 0);
        index.append(seg("s1", 1, "x"));
        assert_eq!(index.span(&SpanId::new("s1")).unwrap().manifest_name(), None);
    }

    #[test]
    fn late_binding_moves_group_without_rekeying() {
        let mut index = SpanIndex::new();
        let id = SpanId::new("s1");
        index.append(seg("s1", 1, "x"));
        assert_eq!(index.current_span(None), Some(&id));

        let outcome = index.bind_manifest(&id, "api".into());
        assert_eq!(outcome, BindOutcome::Rebound { previous: None });
        assert_eq!(index.current_span(None), None);
        assert_eq!(index.current_span(Some("api")), Some(&id));
        assert_eq!(index.segments(&id).unwrap()[0].order_key(), OrderKey::new(1));

        assert_eq!(
            index.bind_manifest(&id, "api".into()),
            BindOutcome::Unchanged
        );
    }

    #[test]
    fn remove_leaves_no_trace() {
        let mut index = SpanIndex::new();
        index.bind_manifest(&SpanId::new("s1"), "x".into());
        index.append(seg("s1", 1, "12345678"));
        index.append(seg("s2", 2, "123456"));

        let removed = index.remove(&SpanId::new("s1")).unwrap();
        assert_eq!(removed.segments.len(), 1);
        assert_eq!(removed.span.manifest_name(), Some("x"));
        assert_eq!(index.byte_size(), 6);
        assert_eq!(index.segment_count(), 1);
        assert!(index.span(&SpanId::new("s1")).is_none());
        assert!(index.manifest_names().is_empty());
        assert!(index.remove(&SpanId::new("s1")).is_none());
    }

    #[test]
    fn current_is_latest_created() {
        let mut index = SpanIndex::new();
        index.bind_manifest(&SpanId::new("b1"), "web".into());
        index.bind_manifest(&SpanId::new("b2"), "web".into());
        index.append(seg("b1", 1, "old"));
        index.append(seg("b2", 2, "new"));
        index.append(seg("b1", 3, "late output from the old build"));

        let b1 = index.span(&SpanId::new("b1")).unwrap();
        let b2 = index.span(&SpanId::new("b2")).unwrap();
        assert!(!index.is_current(b1));
        assert!(index.is_current(b2));
    }

    #[test]
    fn spans_for_manifests_filters() {
        let mut index = SpanIndex::new();
        index.bind_manifest(&SpanId::new("a"), "web".into());
        index.bind_manifest(&SpanId::new("b"), "api".into());
        index.append(seg("a", 1, "x"));
        index.append(seg("b", 2, "y"));
        index.append(seg("c", 3, "z"));

        let all = index.spans_for_manifests(&ManifestFilter::All);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].span.id().as_str(), "a");

        let web = index.spans_for_manifests(&ManifestFilter::only(["web"]));
        assert_eq!(web.len(), 1);
        assert!(web[0].current);

        let bad = index.spans_for_manifests(&ManifestFilter::only([""]));
        assert!(bad.is_empty());

        assert_eq!(index.manifest_names(), vec!["api", "web"]);
    }
}
