//! The log store.
//!
//! [`LogStore`] owns the span index, assigns global order keys, applies
//! mutations atomically, enforces the byte ceiling and notifies listeners.
//!
//! Every mutation is one commit: the index is updated (including any
//! eviction it triggers) under the write lock, the lock is released, and
//! then exactly one [`LogUpdateEvent`] is delivered to every listener. A
//! mutation submitted while listeners are running is queued and applied
//! after the current round, never nested inside it.
//!
//! # Usage
//!
//! ```rust
//! use spanlog_core::{IngestEntry, LogStore, ManifestFilter};
//!
//! let store = LogStore::new();
//! store.ingest(vec![
//!     IngestEntry::new("build-1", "Compiling\n").manifest("web"),
//!     IngestEntry::new("build-1", "Done\n").manifest("web"),
//! ]);
//!
//! let view = store.view(&ManifestFilter::only(["web"]));
//! assert_eq!(view.len(), 2);
//! assert_eq!(store.size_bytes(), 15);
//! ```

use crate::config::Config;
use crate::error::CoreResult;
use crate::eviction::Evictor;
use crate::listener::{
    ListenerRegistry, LogListener, LogUpdateAction, LogUpdateEvent, SubscriptionHandle,
};
use crate::segment::{IngestEntry, Segment};
use crate::span::{BindOutcome, RemovedSpan, Span, SpanIndex, SpanSummary};
use crate::stats::StoreStats;
use crate::types::{OrderKey, SpanId};
use crate::view::{self, LogLine, ManifestFilter, RenderOptions, ViewEntry};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

/// Result of submitting a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStatus {
    /// The mutation committed and this event was delivered.
    Committed(LogUpdateEvent),
    /// The mutation changed nothing; no event was emitted.
    Unchanged,
    /// The mutation arrived during notification and was queued for the
    /// next turn.
    Deferred,
}

impl CommitStatus {
    /// The delivered event, if the mutation committed synchronously.
    #[must_use]
    pub fn event(&self) -> Option<&LogUpdateEvent> {
        match self {
            Self::Committed(event) => Some(event),
            _ => None,
        }
    }

    /// Returns true if the mutation committed synchronously.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

#[derive(Debug)]
enum Mutation {
    Ingest(Vec<IngestEntry>),
    Remove(BTreeSet<SpanId>),
    RemoveForManifests(ManifestFilter),
    Clear,
    Bind {
        span_id: SpanId,
        manifest_name: String,
    },
}

#[derive(Debug, Default)]
struct StoreState {
    index: SpanIndex,
    last_order_key: OrderKey,
}

#[derive(Debug, Default)]
struct Dispatch {
    notifying: bool,
    pending: VecDeque<Mutation>,
}

/// Client-side log store.
///
/// One instance per session, shared with consumers through `Arc`.
pub struct LogStore {
    config: Config,
    evictor: Evictor,
    state: RwLock<StoreState>,
    listeners: ListenerRegistry,
    dispatch: Mutex<Dispatch>,
    stats: StoreStats,
}

impl LogStore {
    /// Creates a store with the default configuration.
    pub fn new() -> Self {
        Self::build(Config::default())
    }

    /// Creates a store with a custom configuration.
    pub fn with_config(config: Config) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        Self {
            evictor: Evictor::new(&config),
            config,
            state: RwLock::new(StoreState::default()),
            listeners: ListenerRegistry::new(),
            dispatch: Mutex::new(Dispatch::default()),
            stats: StoreStats::new(),
        }
    }

    /// The store configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    // === Mutations ===

    /// Appends a batch of segments in order, as one commit.
    ///
    /// Entries with an empty span id are skipped. Spans are created on
    /// first sight; an entry's manifest name, if present, binds its span.
    pub fn ingest<I>(&self, batch: I) -> CommitStatus
    where
        I: IntoIterator<Item = IngestEntry>,
    {
        self.submit(Mutation::Ingest(batch.into_iter().collect()))
    }

    /// Removes exactly the named spans. Unknown ids are ignored.
    pub fn remove_spans<I, S>(&self, ids: I) -> CommitStatus
    where
        I: IntoIterator<Item = S>,
        S: Into<SpanId>,
    {
        self.submit(Mutation::Remove(ids.into_iter().map(Into::into).collect()))
    }

    /// Removes every span bound to a manifest matching the filter.
    pub fn remove_spans_for_manifests(&self, filter: &ManifestFilter) -> CommitStatus {
        self.submit(Mutation::RemoveForManifests(filter.clone()))
    }

    /// Removes every span, and forgets bindings for spans not seen yet.
    pub fn clear(&self) -> CommitStatus {
        self.submit(Mutation::Clear)
    }

    /// Binds a span to a manifest, now or when the span first appears.
    pub fn bind_manifest(
        &self,
        span_id: impl Into<SpanId>,
        manifest_name: impl Into<String>,
    ) -> CommitStatus {
        self.submit(Mutation::Bind {
            span_id: span_id.into(),
            manifest_name: manifest_name.into(),
        })
    }

    // === Listeners ===

    /// Subscribes a listener to all future commits.
    pub fn subscribe<L>(&self, listener: L) -> SubscriptionHandle
    where
        L: LogListener + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Cancels a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.listeners.unsubscribe(handle)
    }

    /// Number of subscribed listeners.
    pub fn subscriber_count(&self) -> usize {
        self.listeners.subscriber_count()
    }

    // === Reads ===

    /// Segments matching the filter, in order key order.
    pub fn view(&self, filter: &ManifestFilter) -> Vec<ViewEntry> {
        view::build_view(&self.state.read().index, filter)
    }

    /// Segments matching the filter with an order key above `after`.
    pub fn view_since(&self, filter: &ManifestFilter, after: OrderKey) -> Vec<ViewEntry> {
        view::build_view_since(&self.state.read().index, filter, after)
    }

    /// Line view of the segments matching the filter.
    pub fn lines(&self, filter: &ManifestFilter) -> Vec<LogLine> {
        view::build_lines(&self.state.read().index, filter)
    }

    /// Renders the filtered view as text.
    pub fn render(&self, filter: &ManifestFilter, options: RenderOptions) -> String {
        view::render(&self.state.read().index, filter, options)
    }

    /// Retained text size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.state.read().index.byte_size()
    }

    /// Number of retained segments.
    pub fn segment_count(&self) -> usize {
        self.state.read().index.segment_count()
    }

    /// Number of retained spans.
    pub fn span_count(&self) -> usize {
        self.state.read().index.span_count()
    }

    /// Returns true if nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.state.read().index.is_empty()
    }

    /// Metadata of a retained span.
    pub fn span(&self, span_id: &SpanId) -> Option<Span> {
        self.state.read().index.span(span_id).cloned()
    }

    /// Spans bound to manifests matching the filter, oldest first.
    pub fn spans_for_manifests(&self, filter: &ManifestFilter) -> Vec<SpanSummary> {
        self.state.read().index.spans_for_manifests(filter)
    }

    /// Sorted names of manifests with retained spans.
    pub fn manifest_names(&self) -> Vec<String> {
        self.state.read().index.manifest_names()
    }

    /// Highest order key assigned so far, `OrderKey::ZERO` if none.
    pub fn upper_order_key(&self) -> OrderKey {
        self.state.read().last_order_key
    }

    /// Store statistics.
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    // === Commit protocol ===

    fn submit(&self, mutation: Mutation) -> CommitStatus {
        {
            let mut dispatch = self.dispatch.lock();
            if dispatch.notifying {
                tracing::debug!(?mutation, "mutation during notification, deferring");
                dispatch.pending.push_back(mutation);
                self.stats.record_deferred();
                return CommitStatus::Deferred;
            }
            dispatch.notifying = true;
        }

        let status = self.commit(mutation);

        loop {
            let next = {
                let mut dispatch = self.dispatch.lock();
                match dispatch.pending.pop_front() {
                    Some(next) => next,
                    None => {
                        dispatch.notifying = false;
                        break;
                    }
                }
            };
            self.commit(next);
        }

        status
    }

    fn commit(&self, mutation: Mutation) -> CommitStatus {
        let event = {
            let mut state = self.state.write();
            match mutation {
                Mutation::Ingest(entries) => self.apply_ingest(&mut state, entries),
                Mutation::Remove(ids) => self.apply_remove(&mut state, ids),
                Mutation::RemoveForManifests(filter) => {
                    let ids = state
                        .index
                        .spans_for_manifests(&filter)
                        .into_iter()
                        .map(|s| s.span.id)
                        .collect();
                    self.apply_remove(&mut state, ids)
                }
                Mutation::Clear => {
                    let dropped = state.index.drop_pending_bindings();
                    if dropped > 0 {
                        tracing::debug!(dropped, "cleared pending manifest bindings");
                    }
                    let ids = state.index.span_ids().into_iter().collect();
                    self.apply_remove(&mut state, ids)
                }
                Mutation::Bind {
                    span_id,
                    manifest_name,
                } => self.apply_bind(&mut state, span_id, manifest_name),
            }
        };

        match event {
            Some(event) => {
                let report = self.listeners.notify(&event);
                self.stats
                    .record_notify(report.delivered as u64, report.failed as u64);
                CommitStatus::Committed(event)
            }
            None => CommitStatus::Unchanged,
        }
    }

    fn apply_ingest(
        &self,
        state: &mut StoreState,
        entries: Vec<IngestEntry>,
    ) -> Option<LogUpdateEvent> {
        let mut appended = BTreeSet::new();
        let mut manifests = BTreeSet::new();
        let mut rebound = false;
        let mut segments = 0u64;
        let mut bytes = 0u64;

        for entry in entries {
            if entry.span_id.is_empty() {
                tracing::warn!("skipping ingest entry with empty span id");
                self.stats.record_skipped_entry();
                continue;
            }

            if let Some(name) = entry.manifest_name {
                match bind(state, &entry.span_id, name) {
                    Some(BindOutcome::Rebound { previous }) => {
                        rebound = true;
                        manifests.extend(previous);
                    }
                    Some(_) | None => {}
                }
            }

            let key = state.last_order_key.next();
            state.last_order_key = key;
            let segment = Segment::new(entry.span_id.clone(), key, entry.text, entry.fields);
            segments += 1;
            bytes += segment.byte_size();
            state.index.append(segment);
            appended.insert(entry.span_id);
        }

        if appended.is_empty() {
            return None;
        }
        self.stats.record_ingest(segments, bytes);

        manifests.extend(
            appended
                .iter()
                .filter_map(|id| state.index.span(id))
                .filter_map(|span| span.manifest_name().map(str::to_string)),
        );

        let evicted = self.evict(state);
        let action = if !evicted.is_empty() {
            LogUpdateAction::Truncate
        } else if rebound {
            LogUpdateAction::Rebind
        } else {
            LogUpdateAction::Append
        };

        let mut affected_spans = appended;
        for removed in evicted {
            manifests.extend(removed.span.manifest_name);
            affected_spans.insert(removed.span.id);
        }

        tracing::debug!(
            ?action,
            segments,
            bytes,
            upper = %state.last_order_key,
            retained = state.index.byte_size(),
            "ingest committed"
        );

        Some(LogUpdateEvent {
            action,
            affected_spans,
            affected_manifests: manifests,
            upper_order_key: state.last_order_key,
        })
    }

    fn evict(&self, state: &mut StoreState) -> Vec<RemovedSpan> {
        let plan = self.evictor.plan(&state.index);
        if plan.is_empty() {
            if !plan.reaches_target {
                tracing::debug!(
                    retained = state.index.byte_size(),
                    ceiling = self.config.byte_ceiling,
                    "above ceiling but only current spans remain"
                );
            }
            return Vec::new();
        }

        let removed: Vec<RemovedSpan> = plan
            .victims
            .iter()
            .filter_map(|id| state.index.remove(id))
            .collect();
        self.stats
            .record_eviction(removed.len() as u64, plan.bytes_released);

        tracing::debug!(
            spans = removed.len(),
            released = plan.bytes_released,
            retained = state.index.byte_size(),
            reached_target = plan.reaches_target,
            "evicted spans"
        );
        removed
    }

    fn apply_remove(&self, state: &mut StoreState, ids: BTreeSet<SpanId>) -> Option<LogUpdateEvent> {
        let mut affected_spans = BTreeSet::new();
        let mut affected_manifests = BTreeSet::new();
        let mut bytes = 0u64;

        for id in ids {
            let Some(removed) = state.index.remove(&id) else {
                tracing::warn!(span = %id, "remove requested for unknown span");
                continue;
            };
            bytes += removed.span.byte_size();
            affected_manifests.extend(removed.span.manifest_name);
            affected_spans.insert(removed.span.id);
        }

        if affected_spans.is_empty() {
            return None;
        }
        self.stats.record_removal(affected_spans.len() as u64, bytes);
        tracing::debug!(spans = affected_spans.len(), bytes, "removed spans");

        Some(LogUpdateEvent {
            action: LogUpdateAction::Truncate,
            affected_spans,
            affected_manifests,
            upper_order_key: state.last_order_key,
        })
    }

    fn apply_bind(
        &self,
        state: &mut StoreState,
        span_id: SpanId,
        manifest_name: String,
    ) -> Option<LogUpdateEvent> {
        let new_manifest = manifest_name.clone();
        let Some(BindOutcome::Rebound { previous }) = bind(state, &span_id, manifest_name) else {
            return None;
        };

        let mut affected_manifests = BTreeSet::new();
        affected_manifests.extend(previous);
        affected_manifests.insert(new_manifest);
        Some(LogUpdateEvent {
            action: LogUpdateAction::Rebind,
            affected_spans: BTreeSet::from([span_id]),
            affected_manifests,
            upper_order_key: state.last_order_key,
        })
    }
}

/// Applies a manifest binding, ignoring unusable names.
fn bind(state: &mut StoreState, span_id: &SpanId, manifest_name: String) -> Option<BindOutcome> {
    if span_id.is_empty() || manifest_name.is_empty() {
        tracing::warn!(span = %span_id, manifest = %manifest_name, "ignoring unusable manifest binding");
        return None;
    }
    Some(state.index.bind_manifest(span_id, manifest_name))
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LogStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogStore")
            .field("config", &self.config)
            .field("size_bytes", &self.size_bytes())
            .field("span_count", &self.span_count())
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn recorder(store: &LogStore) -> Arc<Mutex<Vec<LogUpdateEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        store.subscribe(move |e: &LogUpdateEvent| sink.lock().push(e.clone()));
        events
    }

    fn texts(view: &[ViewEntry]) -> Vec<&str> {
        view.iter().map(|e| e.text.as_str()).collect()
    }

    #[test]
    fn ingest_assigns_increasing_keys_across_spans() {
        let store = LogStore::new();
        store.ingest(vec![IngestEntry::new("a", "1"), IngestEntry::new("b", "2")]);
        store.ingest(vec![IngestEntry::new("a", "3")]);

        let keys: Vec<u64> = store
            .view(&ManifestFilter::All)
            .iter()
            .map(|e| e.order_key.as_u64())
            .collect();
        assert_eq!(keys, vec![1, 2, 3]);
        assert_eq!(store.upper_order_key(), OrderKey::new(3));
    }

    #[test]
    fn one_append_event_per_ingest() {
        let store = LogStore::new();
        let events = recorder(&store);

        store.ingest(vec![
            IngestEntry::new("build-1", "Compiling\n").manifest("web"),
            IngestEntry::new("build-1", "Done\n").manifest("web"),
            IngestEntry::new("build-2", "Starting\n").manifest("api"),
        ]);

        let events = events.lock();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.action, LogUpdateAction::Append);
        assert_eq!(event.upper_order_key, OrderKey::new(3));
        assert_eq!(event.affected_spans.len(), 2);
        assert_eq!(
            event.affected_manifests,
            BTreeSet::from(["api".to_string(), "web".to_string()])
        );
    }

    #[test]
    fn scenario_interleaved_manifests() {
        let store = LogStore::new();
        store.bind_manifest("build-1", "web");
        store.bind_manifest("build-2", "api");
        store.ingest(vec![
            IngestEntry::new("build-1", "Compiling\n"),
            IngestEntry::new("build-1", "Done\n"),
        ]);
        store.ingest(vec![IngestEntry::new("build-2", "Starting\n")]);

        let web = store.view(&ManifestFilter::only(["web"]));
        assert_eq!(texts(&web), vec!["Compiling\n", "Done\n"]);

        let both = store.view(&ManifestFilter::only(["web", "api"]));
        assert_eq!(texts(&both), vec!["Compiling\n", "Done\n", "Starting\n"]);
    }

    #[test]
    fn scenario_eviction_drops_oldest_span() {
        let config = Config::new().byte_ceiling(10).eviction_target_ratio(0.5);
        let store = LogStore::with_config(config).unwrap();
        let events = recorder(&store);

        store.ingest(vec![IngestEntry::new("s1", "12345678").manifest("x")]);
        let status = store.ingest(vec![IngestEntry::new("s2", "123456").manifest("x")]);

        assert_eq!(store.size_bytes(), 6);
        assert!(store.span(&SpanId::new("s1")).is_none());
        assert!(store.span(&SpanId::new("s2")).is_some());

        let event = status.event().unwrap();
        assert_eq!(event.action, LogUpdateAction::Truncate);
        assert!(event.affected_spans.contains("s1"));
        assert!(event.affected_spans.contains("s2"));
        assert_eq!(events.lock().len(), 2);
        assert_eq!(store.stats().spans_evicted(), 1);
    }

    #[test]
    fn sole_span_survives_above_ceiling() {
        let config = Config::new().byte_ceiling(10).eviction_target_ratio(0.5);
        let store = LogStore::with_config(config).unwrap();

        for _ in 0..5 {
            let status = store.ingest(vec![IngestEntry::new("only", "0123456789").manifest("x")]);
            assert_eq!(status.event().unwrap().action, LogUpdateAction::Append);
        }
        assert_eq!(store.size_bytes(), 50);
        assert_eq!(store.span_count(), 1);
    }

    #[test]
    fn scenario_remove_unknown_span_is_silent() {
        let store = LogStore::new();
        let events = recorder(&store);
        store.ingest(vec![IngestEntry::new("s2", "x")]);

        assert_eq!(store.remove_spans(["s1"]), CommitStatus::Unchanged);
        assert_eq!(events.lock().len(), 1);
    }

    #[test]
    fn remove_spans_emits_one_truncate() {
        let store = LogStore::new();
        store.ingest(vec![
            IngestEntry::new("a", "aaa").manifest("web"),
            IngestEntry::new("b", "bb").manifest("api"),
        ]);
        let events = recorder(&store);

        let status = store.remove_spans(["a", "missing"]);
        let event = status.event().unwrap();
        assert_eq!(event.action, LogUpdateAction::Truncate);
        assert_eq!(event.affected_spans, BTreeSet::from([SpanId::new("a")]));
        assert_eq!(event.affected_manifests, BTreeSet::from(["web".to_string()]));
        assert_eq!(event.upper_order_key, OrderKey::new(2));

        assert_eq!(events.lock().len(), 1);
        assert_eq!(store.size_bytes(), 2);
        assert!(store.view(&ManifestFilter::All).iter().all(|e| e.span_id.as_str() != "a"));
    }

    #[test]
    fn keys_are_not_reused_after_truncation() {
        let store = LogStore::new();
        store.ingest(vec![IngestEntry::new("a", "1"), IngestEntry::new("a", "2")]);
        store.clear();
        assert!(store.is_empty());
        store.ingest(vec![IngestEntry::new("a", "3")]);
        assert_eq!(store.view(&ManifestFilter::All)[0].order_key, OrderKey::new(3));
    }

    #[test]
    fn remove_for_manifests_resolves_spans() {
        let store = LogStore::new();
        store.ingest(vec![
            IngestEntry::new("w1", "a").manifest("web"),
            IngestEntry::new("w2", "b").manifest("web"),
            IngestEntry::new("a1", "c").manifest("api"),
        ]);

        let status = store.remove_spans_for_manifests(&ManifestFilter::only(["web"]));
        assert_eq!(status.event().unwrap().affected_spans.len(), 2);
        assert_eq!(store.manifest_names(), vec!["api"]);

        let status = store.remove_spans_for_manifests(&ManifestFilter::only([""]));
        assert_eq!(status, CommitStatus::Unchanged);
    }

    #[test]
    fn empty_span_ids_are_skipped() {
        let store = LogStore::new();
        let status = store.ingest(vec![IngestEntry::new("", "lost"), IngestEntry::new("s", "kept")]);
        assert!(status.is_committed());
        assert_eq!(store.segment_count(), 1);
        assert_eq!(store.stats().entries_skipped(), 1);

        assert_eq!(store.ingest(vec![IngestEntry::new("", "x")]), CommitStatus::Unchanged);
        assert_eq!(store.ingest(Vec::new()), CommitStatus::Unchanged);
    }

    #[test]
    fn late_binding_emits_rebind() {
        let store = LogStore::new();
        store.ingest(vec![IngestEntry::new("pod-1", "booting\n")]);
        assert!(store.view(&ManifestFilter::only(["api"])).is_empty());

        let status = store.bind_manifest("pod-1", "api");
        let event = status.event().unwrap();
        assert_eq!(event.action, LogUpdateAction::Rebind);
        assert!(event.requires_rebuild());
        assert!(event.touches(&ManifestFilter::only(["api"])));
        assert_eq!(store.view(&ManifestFilter::only(["api"])).len(), 1);
        assert_eq!(store.view(&ManifestFilter::All)[0].order_key, OrderKey::new(1));

        assert_eq!(store.bind_manifest("pod-1", "api"), CommitStatus::Unchanged);
        assert_eq!(store.bind_manifest("pod-2", "api"), CommitStatus::Unchanged);
    }

    #[test]
    fn listener_reentrant_mutation_is_deferred() {
        let store = Arc::new(LogStore::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let inner = Arc::clone(&store);
        let seen = Arc::clone(&order);
        store.subscribe(move |e: &LogUpdateEvent| {
            seen.lock().push((e.action, e.upper_order_key.as_u64()));
            if e.action == LogUpdateAction::Append && e.upper_order_key == OrderKey::new(1) {
                let status = inner.remove_spans(["s1"]);
                assert_eq!(status, CommitStatus::Deferred);
                // still the committed state of the current round
                assert_eq!(inner.segment_count(), 1);
            }
        });

        let status = store.ingest(vec![IngestEntry::new("s1", "x")]);
        assert!(status.is_committed());
        assert!(store.is_empty());
        assert_eq!(
            *order.lock(),
            vec![(LogUpdateAction::Append, 1), (LogUpdateAction::Truncate, 1)]
        );
        assert_eq!(store.stats().mutations_deferred(), 1);
    }

    #[test]
    fn panicking_listener_does_not_roll_back() {
        let store = LogStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        store.subscribe(|_: &LogUpdateEvent| panic!("bad consumer"));
        let c = Arc::clone(&calls);
        store.subscribe(move |_: &LogUpdateEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        store.ingest(vec![IngestEntry::new("s", "x")]);
        store.ingest(vec![IngestEntry::new("s", "y")]);

        assert_eq!(store.segment_count(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.subscriber_count(), 1);
        assert_eq!(store.stats().listener_failures(), 1);
    }

    #[test]
    fn listener_observes_state_after_eviction() {
        let store = Arc::new(
            LogStore::with_config(Config::new().byte_ceiling(10).eviction_target_ratio(0.5))
                .unwrap(),
        );
        let sizes = Arc::new(Mutex::new(Vec::new()));

        let inner = Arc::clone(&store);
        let seen = Arc::clone(&sizes);
        store.subscribe(move |_: &LogUpdateEvent| {
            seen.lock().push(inner.size_bytes());
        });

        store.ingest(vec![IngestEntry::new("s1", "12345678").manifest("x")]);
        store.ingest(vec![IngestEntry::new("s2", "123456").manifest("x")]);

        assert_eq!(*sizes.lock(), vec![8, 6]);
    }

    #[test]
    fn clear_forgets_pending_bindings() {
        let store = LogStore::new();
        assert_eq!(store.bind_manifest("pod-9", "api"), CommitStatus::Unchanged);

        assert_eq!(store.clear(), CommitStatus::Unchanged);
        store.ingest(vec![IngestEntry::new("pod-9", "booting\n")]);

        assert!(store.view(&ManifestFilter::only(["api"])).is_empty());
        assert_eq!(store.span(&SpanId::new("pod-9")).unwrap().manifest_name(), None);
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(LogStore::with_config(Config::new().eviction_target_ratio(1.5)).is_err());
    }
}
